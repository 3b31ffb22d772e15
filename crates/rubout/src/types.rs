use crate::geometry::ids::ToolId;
use geo::{LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy used to fill one polygon with tool paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearMethod {
    /// Concentric inward offset rings.
    Standard,
    /// Circles grown outward from a seed point, clipped to the polygon.
    Seed,
    /// Parallel raster lines clipped to the polygon.
    Lines,
    /// Lines, then Seed, then Standard; first non-empty result wins.
    Combo,
}

/// Tool motion direction relative to the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MillingDirection {
    Climb,
    Conventional,
}

/// What a tool contributes to the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolRole {
    /// Clears the open area between copper and the boundary.
    Clear,
    /// Routes an isolation ring around the copper outline.
    Isolation,
}

/// Processing order for the tool pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOrder {
    /// Keep the pool in the order it was supplied.
    Default,
    /// Ascending diameter.
    Forward,
    /// Descending diameter.
    Reverse,
}

/// A round cutting tool in the job pool.
///
/// The id is assigned at creation and never changes; every other field may be
/// edited afterwards, so downstream maps key on the id rather than the
/// diameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
    pub diameter: f64,
    pub method: ClearMethod,
    /// Fraction of the diameter by which adjacent passes overlap, e.g. 0.4
    /// for 40%. Path spacing is `diameter * (1 - overlap)`.
    pub overlap: f64,
    /// Join adjacent raster line ends with traversal segments (Lines method).
    pub connect: bool,
    /// Add a perimeter-following pass on top of the chosen method.
    pub contour: bool,
    /// Stand-off distance kept between clearing passes and copper.
    #[serde(default)]
    pub offset: Option<f64>,
    pub direction: MillingDirection,
    pub role: ToolRole,
}

impl Tool {
    /// Create a clearing tool with common defaults.
    pub fn new(name: &str, diameter: f64) -> Self {
        Self {
            id: ToolId::new(),
            name: name.to_string(),
            diameter,
            method: ClearMethod::Standard,
            overlap: 0.4,
            connect: true,
            contour: true,
            offset: None,
            direction: MillingDirection::Climb,
            role: ToolRole::Clear,
        }
    }

    pub fn with_method(mut self, method: ClearMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_overlap(mut self, overlap: f64) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_role(mut self, role: ToolRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_connect(mut self, connect: bool) -> Self {
        self.connect = connect;
        self
    }

    pub fn with_contour(mut self, contour: bool) -> Self {
        self.contour = contour;
        self
    }

    /// Tool radius.
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Center-to-center spacing between adjacent passes.
    pub fn step(&self) -> f64 {
        self.diameter * (1.0 - self.overlap)
    }
}

/// Kind of object a clearing boundary can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Plain drawn geometry; its polygons bound the clearing directly.
    Geometry,
    /// Another copper layer; bounded by the hull intersection with the target.
    Copper,
    /// Drill data; cannot supply a clearing boundary.
    Drill,
}

/// A reference object supplying the clearing boundary.
#[derive(Debug, Clone)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub geometry: MultiPolygon<f64>,
}

/// How the clearing extent is chosen.
#[derive(Debug, Clone)]
pub enum SelectionMode {
    /// Bound the clearing by the copper itself (convex hull).
    Itself,
    /// Bound the clearing by user-drawn shapes.
    AreaSelection(Vec<Polygon<f64>>),
    /// Bound the clearing by another object.
    ReferenceObject(Reference),
}

/// Immutable per-job configuration, passed into the engine at call time.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub selection: SelectionMode,
    pub order: ToolOrder,
    pub rest_machining: bool,
    /// Distance the bounding region extends past the resolved boundary.
    pub margin: f64,
    pub check_tool_validity: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            selection: SelectionMode::Itself,
            order: ToolOrder::Default,
            rest_machining: false,
            margin: 1.0,
            check_tool_validity: true,
        }
    }
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_order(mut self, order: ToolOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_rest_machining(mut self, rest: bool) -> Self {
        self.rest_machining = rest;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_check_tool_validity(mut self, check: bool) -> Self {
        self.check_tool_validity = check;
        self
    }
}

/// One continuous tool path.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearPath {
    /// Closed loop; the last coordinate repeats the first.
    Ring(LineString<f64>),
    /// Open polyline, e.g. a raster line or a connected raster chain.
    Segment(LineString<f64>),
}

impl ClearPath {
    pub fn points(&self) -> &LineString<f64> {
        match self {
            ClearPath::Ring(ls) | ClearPath::Segment(ls) => ls,
        }
    }

    pub fn is_ring(&self) -> bool {
        matches!(self, ClearPath::Ring(_))
    }
}

/// Completion state of a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Done,
    DoneWithWarnings,
}

/// Non-fatal conditions accumulated while a job runs.
#[derive(Debug, Clone, Default)]
pub struct JobWarnings {
    /// Isolation-role tools whose diameter exceeded the job margin.
    pub broken_isolation: usize,
    /// Representative points of polygons no strategy could clear.
    pub failed_polygons: Vec<Point<f64>>,
}

impl JobWarnings {
    pub fn is_clean(&self) -> bool {
        self.broken_isolation == 0 && self.failed_polygons.is_empty()
    }
}

/// Result of a clearing job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Paths per tool; tools that produced nothing are already dropped.
    pub tool_paths: BTreeMap<ToolId, Vec<ClearPath>>,
    /// Union of the swept area of every kept path, for rendering and for
    /// downstream G-code generation.
    pub cleared_union: MultiPolygon<f64>,
    pub warnings: JobWarnings,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn tool_count(&self) -> usize {
        self.tool_paths.len()
    }

    pub fn path_count(&self) -> usize {
        self.tool_paths.values().map(|p| p.len()).sum()
    }
}

/// Snapshot of job progress, delivered through the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct JobProgress {
    /// Zero-based index of the tool being processed.
    pub tool_index: usize,
    pub tool_count: usize,
    pub polygons_done: usize,
    pub polygon_count: usize,
}

impl JobProgress {
    pub fn percent(&self) -> f64 {
        if self.tool_count == 0 {
            return 100.0;
        }
        let polygon_share = if self.polygon_count == 0 {
            1.0
        } else {
            (self.polygons_done as f64 / self.polygon_count as f64).min(1.0)
        };
        ((self.tool_index as f64 + polygon_share) / self.tool_count as f64 * 100.0).min(100.0)
    }
}

/// Write-only progress side channel; must not affect control flow.
pub type ProgressFn = Box<dyn Fn(JobProgress) + Send + Sync>;
