use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::geometry::ViewportMetrics;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Raw environment signal from the embedding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentSignal {
    Resize { width: u32, height: u32 },
    OrientationChange { width: u32, height: u32 },
    /// Height currently covered by the on-screen keyboard.
    KeyboardInset(u32),
    /// Bottom safe-area inset (home indicator, gesture bar).
    SafeAreaInset(u32),
    /// A text input gained focus; the host may already know the keyboard height.
    InputFocused { keyboard_height: Option<u32> },
    InputBlurred,
}

impl EnvironmentSignal {
    pub fn is_focus_change(&self) -> bool {
        matches!(
            self,
            EnvironmentSignal::InputFocused { .. } | EnvironmentSignal::InputBlurred
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentSignal::Resize { .. } => "resize",
            EnvironmentSignal::OrientationChange { .. } => "orientation_change",
            EnvironmentSignal::KeyboardInset(_) => "keyboard_inset",
            EnvironmentSignal::SafeAreaInset(_) => "safe_area_inset",
            EnvironmentSignal::InputFocused { .. } => "input_focused",
            EnvironmentSignal::InputBlurred => "input_blurred",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Latest known raw viewport state, folded from every signal seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub keyboard_height: u32,
    pub safe_area_bottom: u32,
    pub input_focused: bool,
    pub orientation: Orientation,
}

impl ViewportState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            keyboard_height: 0,
            safe_area_bottom: 0,
            input_focused: false,
            orientation: Orientation::of(width, height),
        }
    }

    pub fn with_safe_area(mut self, bottom: u32) -> Self {
        self.safe_area_bottom = bottom;
        self
    }

    pub fn apply(&mut self, signal: EnvironmentSignal) {
        match signal {
            EnvironmentSignal::Resize { width, height }
            | EnvironmentSignal::OrientationChange { width, height } => {
                self.width = width;
                self.height = height;
                self.orientation = Orientation::of(width, height);
            }
            EnvironmentSignal::KeyboardInset(inset) => self.keyboard_height = inset,
            EnvironmentSignal::SafeAreaInset(inset) => self.safe_area_bottom = inset,
            EnvironmentSignal::InputFocused { keyboard_height } => {
                self.input_focused = true;
                if let Some(height) = keyboard_height {
                    self.keyboard_height = height;
                }
            }
            EnvironmentSignal::InputBlurred => {
                self.input_focused = false;
                self.keyboard_height = 0;
            }
        }
    }

    pub fn metrics(&self) -> ViewportMetrics {
        let inset_bottom = self.keyboard_height.saturating_add(self.safe_area_bottom);
        ViewportMetrics::new(
            self.width,
            self.height,
            self.height.saturating_sub(inset_bottom),
            inset_bottom,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Quiet period after the last raw signal before a snapshot is emitted.
    pub debounce: Duration,
    /// Emit an extra snapshot straight away on input focus/blur.
    pub immediate_on_focus: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            immediate_on_focus: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&ViewportMetrics)>;

/// Turns bursty environment signals into a debounced stream of metrics.
///
/// Time is supplied by the caller, so the monitor never sleeps. A driver asks
/// [`ViewportMonitor::time_until_due`] how long it may wait for the next
/// signal and calls [`ViewportMonitor::poll`] when that time has passed.
pub struct ViewportMonitor {
    config: MonitorConfig,
    state: ViewportState,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    deadline: Option<Instant>,
    signals_seen: u64,
    snapshots_emitted: u64,
}

impl ViewportMonitor {
    pub fn new(config: MonitorConfig, initial: ViewportState) -> Self {
        Self {
            config,
            state: initial,
            observers: Vec::new(),
            next_observer: 0,
            deadline: None,
            signals_seen: 0,
            snapshots_emitted: 0,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /// Metrics for the latest state, without emitting.
    pub fn current(&self) -> ViewportMetrics {
        self.state.metrics()
    }

    pub fn observe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&ViewportMetrics) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Fold a raw signal into the state and restart the debounce window.
    pub fn signal(&mut self, signal: EnvironmentSignal, now: Instant) {
        self.signals_seen += 1;
        self.state.apply(signal);
        self.deadline = Some(now + self.config.debounce);

        if signal.is_focus_change() && self.config.immediate_on_focus {
            self.emit();
        }
    }

    /// Emit the settled snapshot if the debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.emit();
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn is_settled(&self) -> bool {
        self.deadline.is_none()
    }

    pub fn signals_seen(&self) -> u64 {
        self.signals_seen
    }

    pub fn snapshots_emitted(&self) -> u64 {
        self.snapshots_emitted
    }

    fn emit(&mut self) {
        let snapshot = self.state.metrics();
        self.snapshots_emitted += 1;
        for (_, observer) in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }
}
