//! Error types for the clearing engine.

use thiserror::Error;

/// Errors that can end a clearing job or one of its stages.
///
/// Per-polygon clear failures are deliberately absent: they are recovered
/// locally, counted, and surfaced through [`crate::JobWarnings`] instead of
/// aborting the job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClearError {
    /// Target or bounding geometry was empty where a boundary is required.
    #[error("no geometry to work on")]
    NoGeometry,

    /// Subtracting copper from the bounding region left nothing to clear.
    #[error("could not get the extent of the area to be cleared")]
    EmptyExtentNotFound,

    /// The reference object kind cannot supply a clearing boundary.
    #[error("unsupported reference object kind: {0}")]
    UnsupportedReferenceKind(String),

    /// Every tool in the job ended with an empty result set.
    #[error("no result geometry: all tools produced empty output")]
    NoResultGeometry,

    /// The cooperative abort flag was observed.
    #[error("clearing cancelled by user")]
    Cancelled,

    /// The tool pool failed validation.
    #[error("invalid tool pool: {0}")]
    InvalidTool(String),
}

/// Result type alias for clearing operations.
pub type ClearResult<T> = Result<T, ClearError>;
