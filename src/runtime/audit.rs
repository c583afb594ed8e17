//! Controller lifecycle audit hooks.
//!
//! Records capture a stage identifier plus structured details so callers can
//! log, buffer or replay how the controller reacted to viewport changes
//! without touching the resolve path.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Checkpoints emitted by `LayoutController`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAuditStage {
    /// The controller subscribed to a monitor.
    Started,
    /// A metrics snapshot reached the controller.
    SnapshotReceived,
    /// The breakpoint tier differs from the previous pass.
    TierChanged,
    /// A pass was dropped because newer metrics arrived before it published.
    PassSuperseded,
    /// The renderer accepted a layout.
    LayoutPublished,
    /// The renderer returned an error.
    PublishFailed,
    /// The controller unsubscribed.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct LayoutAuditEvent {
    pub timestamp: SystemTime,
    pub stage: LayoutAuditStage,
    pub details: Vec<(String, Value)>,
}

impl LayoutAuditEvent {
    fn new(stage: LayoutAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }
}

pub struct LayoutAuditEventBuilder {
    event: LayoutAuditEvent,
}

impl LayoutAuditEventBuilder {
    pub fn new(stage: LayoutAuditStage) -> Self {
        Self {
            event: LayoutAuditEvent::new(stage),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.details.push((key.into(), value.into()));
        self
    }

    pub fn finish(self) -> LayoutAuditEvent {
        self.event
    }
}

pub trait LayoutAudit: Send + Sync {
    fn record(&self, event: LayoutAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullLayoutAudit;

impl LayoutAudit for NullLayoutAudit {
    fn record(&self, _event: LayoutAuditEvent) {}
}

/// Buffers every audit event in memory.
#[derive(Debug, Default)]
pub struct MemoryLayoutAudit {
    events: Mutex<Vec<LayoutAuditEvent>>,
}

impl MemoryLayoutAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LayoutAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<LayoutAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl LayoutAudit for MemoryLayoutAudit {
    fn record(&self, event: LayoutAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
