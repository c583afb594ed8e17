use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::logging::{LogEvent, LogLevel, Logger, METRICS_TARGET, RUNTIME_TARGET, json_kv};
use crate::metrics::LayoutMetrics;
use crate::monitor::{EnvironmentSignal, ViewportMonitor};

pub mod audit;
pub mod controller;
pub mod driver;

pub use controller::{ControllerConfig, LayoutController, LayoutHandle};

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator; share it with `ControllerConfig` to get one view.
    pub metrics: Option<Arc<Mutex<LayoutMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: METRICS_TARGET.to_string(),
        }
    }
}

/// A raw signal stamped with the time the host observed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedSignal {
    pub at: Instant,
    pub signal: EnvironmentSignal,
}

impl ScriptedSignal {
    pub fn new(at: Instant, signal: EnvironmentSignal) -> Self {
        Self { at, signal }
    }
}

/// Owns a monitor and its controller and feeds one into the other.
pub struct LayoutRuntime {
    monitor: ViewportMonitor,
    controller: LayoutController,
    config: RuntimeConfig,
    started_at: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl LayoutRuntime {
    pub fn new(monitor: ViewportMonitor, controller: LayoutController) -> Self {
        Self {
            monitor,
            controller,
            config: RuntimeConfig::default(),
            started_at: None,
            last_metrics_emit: None,
        }
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn monitor(&self) -> &ViewportMonitor {
        &self.monitor
    }

    pub fn controller(&self) -> &LayoutController {
        &self.controller
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn start(&mut self, now: Instant) {
        if self.controller.is_running() {
            return;
        }
        self.started_at = Some(now);
        self.last_metrics_emit = Some(now);
        let metrics = self.monitor.current();
        self.log(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("width", metrics.width),
                json_kv("height", metrics.height),
                json_kv(
                    "debounce_ms",
                    self.monitor.config().debounce.as_millis() as u64,
                ),
            ],
        );
        self.controller.start(&mut self.monitor);
    }

    /// Feed one raw signal, then emit if the debounce window already allows it.
    pub fn dispatch(&mut self, signal: EnvironmentSignal, now: Instant) {
        self.with_metrics(LayoutMetrics::record_signal);
        self.log(
            LogLevel::Trace,
            "signal",
            [json_kv("kind", signal.label())],
        );
        self.monitor.signal(signal, now);
        self.tick(now);
    }

    /// Advance time; returns whether a settled snapshot was emitted.
    pub fn tick(&mut self, now: Instant) -> bool {
        let emitted = self.monitor.poll(now);
        self.maybe_emit_metrics(now);
        emitted
    }

    /// Jump to the pending debounce deadline, if any, and emit.
    pub fn settle(&mut self) -> bool {
        match self.monitor.next_deadline() {
            Some(deadline) => self.tick(deadline),
            None => false,
        }
    }

    pub fn run_scripted<I>(&mut self, start: Instant, signals: I)
    where
        I: IntoIterator<Item = ScriptedSignal>,
    {
        self.start(start);
        for ScriptedSignal { at, signal } in signals {
            self.tick(at);
            self.dispatch(signal, at);
        }
        self.settle();
    }

    pub fn stop(&mut self, now: Instant) {
        if !self.controller.is_running() {
            return;
        }
        self.controller.stop(&mut self.monitor);
        self.emit_metrics(now);
        let uptime_ms = self
            .started_at
            .map(|start| now.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or(0);
        self.log(
            LogLevel::Info,
            "runtime_stopped",
            [
                json_kv("uptime_ms", uptime_ms),
                json_kv("signals", self.monitor.signals_seen()),
                json_kv("snapshots", self.monitor.snapshots_emitted()),
            ],
        );
    }

    fn maybe_emit_metrics(&mut self, now: Instant) {
        if self.config.metrics_interval == Duration::ZERO {
            return;
        }
        match self.last_metrics_emit {
            Some(last) if now.saturating_duration_since(last) < self.config.metrics_interval => {}
            _ => self.emit_metrics(now),
        }
    }

    fn emit_metrics(&mut self, now: Instant) {
        self.last_metrics_emit = Some(now);
        let uptime = self
            .started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(uptime)
                    .to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let _ = logger.log_event(LogEvent::with_fields(level, RUNTIME_TARGET, message, fields));
        }
    }

    fn with_metrics(&self, record: impl FnOnce(&mut LayoutMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }
}
