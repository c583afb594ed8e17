//! Layout module orchestrator.
//!
//! Downstream code imports resolver types from here while the placement and
//! compression logic lives in the private `core` module.

mod core;

pub use core::{ResolvedGeometry, ResolvedLayout, place, resolve};
