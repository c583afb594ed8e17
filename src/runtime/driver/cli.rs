use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal;
use thiserror::Error;

use crate::monitor::EnvironmentSignal;
use crate::runtime::LayoutRuntime;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Translate a terminal event into a viewport signal.
///
/// The terminal window stands in for the embedding host: its cell grid is
/// the viewport, and window focus is treated as input focus.
pub fn signal_from_event(event: &Event) -> Option<EnvironmentSignal> {
    match event {
        Event::Resize(width, height) => Some(EnvironmentSignal::Resize {
            width: u32::from(*width),
            height: u32::from(*height),
        }),
        Event::FocusGained => Some(EnvironmentSignal::InputFocused {
            keyboard_height: None,
        }),
        Event::FocusLost => Some(EnvironmentSignal::InputBlurred),
        _ => None,
    }
}

fn is_exit_key(event: &Event) -> bool {
    match event {
        Event::Key(KeyEvent {
            code, modifiers, kind, ..
        }) if *kind == KeyEventKind::Press => {
            matches!(code, KeyCode::Esc | KeyCode::Char('q'))
                || (*code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
        }
        _ => false,
    }
}

/// Runs a `LayoutRuntime` against the controlling terminal until Esc, `q` or
/// Ctrl-C is pressed. Raw mode and focus reporting are restored on exit.
pub struct TerminalDriver {
    runtime: LayoutRuntime,
    idle_poll: Duration,
}

impl TerminalDriver {
    pub fn new(runtime: LayoutRuntime) -> Self {
        Self {
            runtime,
            idle_poll: Duration::from_millis(250),
        }
    }

    /// Poll interval used while no debounce deadline is pending.
    pub fn with_idle_poll(mut self, idle_poll: Duration) -> Self {
        self.idle_poll = idle_poll;
        self
    }

    /// Drive the runtime, handing it back once the user exits.
    pub fn run(mut self) -> DriverResult<LayoutRuntime> {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner();
        self.exit(&mut stdout);
        result.map(|()| self.runtime)
    }

    fn run_inner(&mut self) -> DriverResult<()> {
        let (width, height) = terminal::size()?;
        let now = Instant::now();
        self.runtime.start(now);
        self.runtime.dispatch(
            EnvironmentSignal::Resize {
                width: u32::from(width),
                height: u32::from(height),
            },
            now,
        );

        loop {
            let timeout = self
                .runtime
                .monitor()
                .time_until_due(Instant::now())
                .unwrap_or(self.idle_poll);

            if event::poll(timeout)? {
                let terminal_event = event::read()?;
                if is_exit_key(&terminal_event) {
                    break;
                }
                if let Some(signal) = signal_from_event(&terminal_event) {
                    self.runtime.dispatch(signal, Instant::now());
                }
            }

            self.runtime.tick(Instant::now());
        }

        self.runtime.stop(Instant::now());
        Ok(())
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| DriverError::Terminal(err.to_string()))?;
        execute!(stdout, EnableFocusChange)?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, DisableFocusChange).ok();
        terminal::disable_raw_mode().ok();
    }
}
