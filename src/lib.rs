//! Viewport-reactive layout engine for a small set of docked UI regions.
//!
//! Regions (headers, floating action "coins", footers) are pinned to the top
//! or bottom edge with a stacking priority. Whenever the viewport changes
//! (resize, rotation, on-screen keyboard) the engine recomputes every region's
//! offset from scratch and hides the lowest-priority regions when space runs
//! out. Each module exposes its public surface from an orchestrator `mod.rs`
//! and keeps the implementation in a private `core` module.

pub mod breakpoint;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod registry;
pub mod render;
pub mod runtime;

pub use breakpoint::{BreakpointTable, BreakpointTier, Threshold, classify};
pub use config::{EngineParts, LayoutConfig, RegionDecl};
pub use error::{LayoutError, RegionConflict, Result};
pub use geometry::{Anchor, Span, ViewportMetrics};
pub use layout::{ResolvedGeometry, ResolvedLayout, place, resolve};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{LayoutMetrics, MetricSnapshot};
pub use monitor::{
    EnvironmentSignal, MonitorConfig, ObserverId, Orientation, ViewportMonitor, ViewportState,
};
pub use registry::{RegionOverride, RegionRegistry, RegionSpec, TierRegion};
pub use render::{JsonLinesRenderer, LayoutRenderer, RendererSettings};
pub use runtime::audit::{
    LayoutAudit, LayoutAuditEvent, LayoutAuditEventBuilder, LayoutAuditStage, MemoryLayoutAudit,
    NullLayoutAudit,
};
pub use runtime::driver::cli::{DriverError, DriverResult, TerminalDriver, signal_from_event};
pub use runtime::{
    ControllerConfig, LayoutController, LayoutHandle, LayoutRuntime, RuntimeConfig,
    ScriptedSignal,
};
