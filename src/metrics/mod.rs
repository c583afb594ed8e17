use crate::logging::{LogEvent, LogFields, LogLevel, json_kv};
use std::time::Duration;

/// Counters for the signal → snapshot → resolve → publish pipeline.
#[derive(Debug, Default, Clone)]
pub struct LayoutMetrics {
    signals: u64,
    snapshots: u64,
    resolves: u64,
    publications: u64,
    superseded: u64,
    hidden_regions: u64,
    render_failures: u64,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_signal(&mut self) {
        self.signals = self.signals.saturating_add(1);
    }

    pub fn record_snapshot(&mut self) {
        self.snapshots = self.snapshots.saturating_add(1);
    }

    pub fn record_resolve(&mut self, hidden: usize) {
        self.resolves = self.resolves.saturating_add(1);
        self.hidden_regions = self.hidden_regions.saturating_add(hidden as u64);
    }

    pub fn record_publication(&mut self) {
        self.publications = self.publications.saturating_add(1);
    }

    /// Count `dropped` passes replaced by a newer snapshot before resolving.
    pub fn record_superseded_n(&mut self, dropped: u64) {
        self.superseded = self.superseded.saturating_add(dropped);
    }

    pub fn record_render_failure(&mut self) {
        self.render_failures = self.render_failures.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            signals: self.signals,
            snapshots: self.snapshots,
            resolves: self.resolves,
            publications: self.publications,
            superseded: self.superseded,
            hidden_regions: self.hidden_regions,
            render_failures: self.render_failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub signals: u64,
    pub snapshots: u64,
    pub resolves: u64,
    pub publications: u64,
    pub superseded: u64,
    pub hidden_regions: u64,
    pub render_failures: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        [
            json_kv("uptime_ms", self.uptime_ms),
            json_kv("signals", self.signals),
            json_kv("snapshots", self.snapshots),
            json_kv("resolves", self.resolves),
            json_kv("publications", self.publications),
            json_kv("superseded", self.superseded),
            json_kv("hidden_regions", self.hidden_regions),
            json_kv("render_failures", self.render_failures),
        ]
        .into_iter()
        .collect()
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }
}
