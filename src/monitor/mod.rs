//! Viewport monitor module orchestrator.

mod core;

pub use core::{
    DEFAULT_DEBOUNCE, EnvironmentSignal, MonitorConfig, ObserverId, Orientation, ViewportMonitor,
    ViewportState,
};
