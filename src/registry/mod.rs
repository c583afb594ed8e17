//! Region registry module orchestrator.
//!
//! Static region declarations and their per-tier merging live in the private
//! `core` module.

mod core;

pub use core::{RegionName, RegionOverride, RegionRegistry, RegionSpec, TierRegion};
