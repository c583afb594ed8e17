//! Breakpoint module orchestrator.
//!
//! Callers import tier types from here; the classification logic lives in
//! the private `core` module.

mod core;

pub use core::{BreakpointTable, BreakpointTier, Threshold, classify};
