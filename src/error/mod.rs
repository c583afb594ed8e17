//! Error module orchestrator.

mod types;

pub use types::{LayoutError, RegionConflict, Result};
