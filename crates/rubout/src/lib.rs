mod boundary;
mod clearer;
mod empty_area;
mod error;
mod geometry;
mod isolation;
mod job;
mod planner;
mod rest;
mod tool_table;
mod types;

pub use boundary::{expand_boundary, resolve_boundary};
pub use clearer::clear_polygon;
pub use empty_area::empty_area;
pub use error::{ClearError, ClearResult};
pub use geometry::*;
pub use isolation::{isolation_envelope, Envelope};
pub use job::ClearJob;
pub use planner::{plan_tool_order, validate_tools};
pub use tool_table::*;
pub use types::*;
