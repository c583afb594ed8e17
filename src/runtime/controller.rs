use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::breakpoint::{BreakpointTable, BreakpointTier};
use crate::geometry::ViewportMetrics;
use crate::layout::{ResolvedLayout, resolve};
use crate::logging::{CONTROLLER_TARGET, LogEvent, LogLevel, Logger, json_kv};
use crate::metrics::LayoutMetrics;
use crate::monitor::{ObserverId, ViewportMonitor};
use crate::registry::RegionRegistry;
use crate::render::LayoutRenderer;

use super::audit::{LayoutAudit, LayoutAuditEventBuilder, LayoutAuditStage, NullLayoutAudit};

/// Observability wiring for a controller.
#[derive(Clone)]
pub struct ControllerConfig {
    pub logger: Option<Logger>,
    pub metrics: Option<Arc<Mutex<LayoutMetrics>>>,
    pub audit: Arc<dyn LayoutAudit>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            audit: Arc::new(NullLayoutAudit),
        }
    }
}

impl ControllerConfig {
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(LayoutMetrics::new())));
        }
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<LayoutMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Single-value mailbox: a newer snapshot replaces one not yet picked up.
#[derive(Default)]
struct PendingSlot {
    latest: Cell<Option<ViewportMetrics>>,
    superseded: Cell<u64>,
}

impl PendingSlot {
    fn offer(&self, metrics: ViewportMetrics) {
        if self.latest.replace(Some(metrics)).is_some() {
            self.superseded.set(self.superseded.get() + 1);
        }
    }

    fn take(&self) -> Option<ViewportMetrics> {
        self.latest.take()
    }

    fn take_superseded(&self) -> u64 {
        self.superseded.replace(0)
    }
}

struct ControllerCore {
    registry: RegionRegistry,
    table: BreakpointTable,
    renderer: Box<dyn LayoutRenderer>,
    config: ControllerConfig,
    running: bool,
    last_tier: Option<BreakpointTier>,
    last_layout: Option<ResolvedLayout>,
}

impl ControllerCore {
    fn receive(&mut self, metrics: &ViewportMetrics) {
        self.with_metrics(LayoutMetrics::record_snapshot);
        self.audit(
            LayoutAuditEventBuilder::new(LayoutAuditStage::SnapshotReceived)
                .detail("width", metrics.width)
                .detail("height", metrics.height)
                .detail("effective_height", metrics.effective_height)
                .detail("inset_bottom", metrics.inset_bottom),
        );
    }

    fn resolve(&mut self, metrics: &ViewportMetrics) -> ResolvedLayout {
        let tier = self.table.classify(metrics.width);
        if self.last_tier.as_ref() != Some(&tier) {
            let from = self
                .last_tier
                .as_ref()
                .map(|t| Value::from(t.as_str()))
                .unwrap_or(Value::Null);
            self.log(
                LogLevel::Info,
                "tier_changed",
                [
                    json_kv("from", from.clone()),
                    json_kv("to", tier.as_str()),
                    json_kv("width", metrics.width),
                ],
            );
            self.audit(
                LayoutAuditEventBuilder::new(LayoutAuditStage::TierChanged)
                    .detail("from", from)
                    .detail("to", tier.as_str()),
            );
            self.last_tier = Some(tier.clone());
        }

        let layout = resolve(&self.registry, &tier, metrics);
        let hidden = layout.hidden_count();
        self.with_metrics(|m| m.record_resolve(hidden));
        layout
    }

    fn superseded(&mut self, dropped: u64) {
        self.with_metrics(|m| m.record_superseded_n(dropped));
        self.log(
            LogLevel::Debug,
            "pass_superseded",
            [json_kv("dropped", dropped)],
        );
        self.audit(
            LayoutAuditEventBuilder::new(LayoutAuditStage::PassSuperseded)
                .detail("dropped", dropped),
        );
    }

    fn publish(&mut self, layout: ResolvedLayout) {
        match self.renderer.on_layout(&layout) {
            Ok(()) => {
                self.with_metrics(LayoutMetrics::record_publication);
                let visible = layout.visible().count();
                let hidden = layout.hidden_count();
                let fingerprint = layout.fingerprint().to_hex().to_string();
                self.log(
                    LogLevel::Debug,
                    "layout_published",
                    [
                        json_kv("tier", layout.tier.as_str()),
                        json_kv("visible", visible),
                        json_kv("hidden", hidden),
                        json_kv("reserved_top", layout.reserved_top()),
                        json_kv("reserved_bottom", layout.reserved_bottom()),
                    ],
                );
                self.audit(
                    LayoutAuditEventBuilder::new(LayoutAuditStage::LayoutPublished)
                        .detail("tier", layout.tier.as_str())
                        .detail("visible", visible)
                        .detail("hidden", hidden)
                        .detail("fingerprint", fingerprint),
                );
                self.last_layout = Some(layout);
            }
            Err(err) => {
                self.with_metrics(LayoutMetrics::record_render_failure);
                self.log(
                    LogLevel::Warn,
                    "publish_failed",
                    [json_kv("error", err.to_string())],
                );
                self.audit(
                    LayoutAuditEventBuilder::new(LayoutAuditStage::PublishFailed)
                        .detail("error", err.to_string()),
                );
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let _ = logger.log_event(LogEvent::with_fields(
                level,
                CONTROLLER_TARGET,
                message,
                fields,
            ));
        }
    }

    fn audit(&self, builder: LayoutAuditEventBuilder) {
        self.config.audit.record(builder.finish());
    }

    fn with_metrics(&self, record: impl FnOnce(&mut LayoutMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }
}

/// Cloneable entry point into a controller.
///
/// Every submission goes through the pending slot; whichever call is not
/// already inside a pass drains it, so a renderer that submits while being
/// called never causes a nested publish.
#[derive(Clone)]
pub struct LayoutHandle {
    core: Rc<RefCell<ControllerCore>>,
    pending: Rc<PendingSlot>,
}

impl LayoutHandle {
    pub fn submit(&self, metrics: ViewportMetrics) {
        self.pending.offer(metrics);
        self.drain();
    }

    /// Most recently published layout. `None` while a pass is in flight.
    pub fn last_layout(&self) -> Option<ResolvedLayout> {
        self.core
            .try_borrow()
            .ok()
            .and_then(|core| core.last_layout.clone())
    }

    fn drain(&self) {
        // A pass is already running further up the stack; it will pick up the slot.
        let Ok(mut core) = self.core.try_borrow_mut() else {
            return;
        };

        while let Some(metrics) = self.pending.take() {
            let dropped = self.pending.take_superseded();
            if !core.running {
                continue;
            }
            if dropped > 0 {
                core.superseded(dropped);
            }
            core.receive(&metrics);
            let layout = core.resolve(&metrics);
            core.publish(layout);
        }
    }
}

/// Subscribes to a [`ViewportMonitor`] and publishes a fresh layout for every
/// snapshot it emits.
pub struct LayoutController {
    handle: LayoutHandle,
    subscription: Option<ObserverId>,
}

impl LayoutController {
    pub fn new<R>(registry: RegionRegistry, table: BreakpointTable, renderer: R) -> Self
    where
        R: LayoutRenderer + 'static,
    {
        let core = ControllerCore {
            registry,
            table,
            renderer: Box::new(renderer),
            config: ControllerConfig::default(),
            running: false,
            last_tier: None,
            last_layout: None,
        };
        Self {
            handle: LayoutHandle {
                core: Rc::new(RefCell::new(core)),
                pending: Rc::new(PendingSlot::default()),
            },
            subscription: None,
        }
    }

    pub fn with_config(self, config: ControllerConfig) -> Self {
        self.handle.core.borrow_mut().config = config;
        self
    }

    /// Subscribe to `monitor` and publish a layout for its current metrics.
    pub fn start(&mut self, monitor: &mut ViewportMonitor) {
        if self.subscription.is_some() {
            return;
        }

        {
            let mut core = self.handle.core.borrow_mut();
            core.running = true;
            core.log(
                LogLevel::Info,
                "controller_started",
                [
                    json_kv("regions", core.registry.len()),
                    json_kv("tiers", core.table.tiers().count()),
                ],
            );
            core.audit(
                LayoutAuditEventBuilder::new(LayoutAuditStage::Started)
                    .detail("regions", core.registry.len()),
            );
        }

        let handle = self.handle.clone();
        self.subscription = Some(monitor.observe(move |metrics| handle.submit(*metrics)));
        self.handle.submit(monitor.current());
    }

    /// Unsubscribe; nothing is published after this returns.
    pub fn stop(&mut self, monitor: &mut ViewportMonitor) {
        if let Some(id) = self.subscription.take() {
            monitor.unobserve(id);
        }
        self.handle.pending.take();
        self.handle.pending.take_superseded();

        let mut core = self.handle.core.borrow_mut();
        if core.running {
            core.running = false;
            core.log(LogLevel::Info, "controller_stopped", std::iter::empty());
            core.audit(LayoutAuditEventBuilder::new(LayoutAuditStage::Stopped));
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn handle(&self) -> LayoutHandle {
        self.handle.clone()
    }

    pub fn last_layout(&self) -> Option<ResolvedLayout> {
        self.handle.last_layout()
    }
}
