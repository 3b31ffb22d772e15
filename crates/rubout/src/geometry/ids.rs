use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique identifier for a tool.
///
/// Stable for the lifetime of the tool: diameters and other parameters may be
/// edited after creation, but the id never changes, so result maps keyed by
/// `ToolId` survive tool edits. Ordered so that per-tool result maps iterate
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(Ulid);

impl ToolId {
    /// Create a new ToolId with a random ULID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Create a ToolId from a ULID.
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Get the underlying ULID.
    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for ToolId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
