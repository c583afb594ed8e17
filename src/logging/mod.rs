//! Structured JSON-lines logging for the layout engine.
//!
//! Events carry a millisecond timestamp, a level, a dotted target and a map of
//! JSON fields. Sinks decide where the serialised lines go.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub const CONTROLLER_TARGET: &str = "room_viewport::controller";
pub const RUNTIME_TARGET: &str = "room_viewport::runtime";
pub const METRICS_TARGET: &str = "room_viewport::metrics";

pub type LogFields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub ts_ms: u128,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "LogFields::is_empty", default)]
    pub fields: LogFields,
}

impl LogEvent {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ts_ms: current_ms(),
            level,
            target: target.into(),
            message: message.into(),
            fields: LogFields::new(),
        }
    }

    pub fn with_fields(
        level: LogLevel,
        target: impl Into<String>,
        message: impl Into<String>,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut event = Self::new(level, target, message);
        event.fields.extend(fields);
        event
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

fn current_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub type LoggingResult<T> = std::result::Result<T, LoggingError>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("log sink poisoned")]
    Poisoned,
}

pub trait LogSink: Send + Sync {
    fn log(&self, event: &LogEvent) -> LoggingResult<()>;
}

/// Cheap-to-clone handle that filters by level before reaching the sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
}

impl Logger {
    pub fn new<S>(sink: S) -> Self
    where
        S: LogSink + 'static,
    {
        Self {
            sink: Arc::new(sink),
            min_level: LogLevel::Trace,
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, target: &str, message: &str) -> LoggingResult<()> {
        self.log_event(LogEvent::new(level, target, message))
    }

    pub fn log_event(&self, event: LogEvent) -> LoggingResult<()> {
        if !self.enabled(event.level) {
            return Ok(());
        }
        self.sink.log(&event)
    }
}

/// JSON-lines log file capped at `max_bytes`.
///
/// When the next line would push the file past the cap, the file is emptied
/// and logging starts over. A cap of zero disables the limit.
pub struct FileSink {
    path: PathBuf,
    max_bytes: u64,
    state: Mutex<FileState>,
}

struct FileState {
    writer: BufWriter<File>,
    written: u64,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, max_bytes: u64) -> LoggingResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            state: Mutex::new(FileState {
                writer: BufWriter::new(file),
                written,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn restart(&self, state: &mut FileState) -> LoggingResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        state.writer = BufWriter::new(file);
        state.written = 0;
        Ok(())
    }
}

impl LogSink for FileSink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let len = line.len() as u64;

        let mut state = self.state.lock().map_err(|_| LoggingError::Poisoned)?;
        if self.max_bytes > 0 && state.written + len > self.max_bytes {
            self.restart(&mut state)?;
        }
        state.writer.write_all(&line)?;
        state.writer.flush()?;
        state.written += len;
        Ok(())
    }
}

/// Keeps events in memory; handy for tests and in-process inspection.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.message).collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, event: &LogEvent) -> LoggingResult<()> {
        self.events
            .lock()
            .map_err(|_| LoggingError::Poisoned)?
            .push(event.clone());
        Ok(())
    }
}

pub fn json_kv(key: &str, value: impl Into<Value>) -> (String, Value) {
    (key.to_string(), value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialise_without_empty_fields() {
        let event = LogEvent::new(LogLevel::Info, CONTROLLER_TARGET, "started");
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"level\":\"info\""));
        assert!(!line.contains("fields"));

        let event = LogEvent::with_fields(
            LogLevel::Debug,
            CONTROLLER_TARGET,
            "layout_published",
            [json_kv("tier", "compact")],
        );
        assert_eq!(event.field("tier"), Some(&json!("compact")));
    }

    #[test]
    fn logger_drops_events_below_min_level() {
        let sink = MemorySink::new();
        let logger = Logger::new(sink.clone()).with_min_level(LogLevel::Info);

        logger.log(LogLevel::Debug, RUNTIME_TARGET, "noise").unwrap();
        logger.log(LogLevel::Warn, RUNTIME_TARGET, "kept").unwrap();

        assert_eq!(sink.messages(), ["kept"]);
    }

    fn scratch_log(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "room_viewport_{name}_{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let path = scratch_log("append");
        let logger = Logger::new(FileSink::new(&path, 0).unwrap());
        logger.log(LogLevel::Info, RUNTIME_TARGET, "runtime_started").unwrap();
        logger
            .log_event(LogEvent::with_fields(
                LogLevel::Debug,
                CONTROLLER_TARGET,
                "layout_published",
                [json_kv("visible", 2)],
            ))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "runtime_started");
        assert_eq!(lines[1]["fields"]["visible"], 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn file_sink_starts_over_past_max_bytes() {
        let path = scratch_log("cap");
        let event = LogEvent::new(LogLevel::Info, METRICS_TARGET, "layout_metrics");
        let line_len = serde_json::to_vec(&event).unwrap().len() as u64 + 1;

        let sink = FileSink::new(&path, line_len * 2).unwrap();
        sink.log(&event).unwrap();
        sink.log(&event).unwrap();
        assert_eq!(std::fs::metadata(sink.path()).unwrap().len(), line_len * 2);

        sink.log(&event).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert_eq!(contents.len() as u64, line_len);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn file_sink_counts_existing_bytes_toward_cap() {
        let path = scratch_log("existing");
        std::fs::write(&path, "x".repeat(100)).unwrap();

        let sink = FileSink::new(&path, 120).unwrap();
        sink.log(&LogEvent::new(LogLevel::Warn, RUNTIME_TARGET, "render_failed"))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.starts_with('x'));
        assert_eq!(contents.lines().count(), 1);
        std::fs::remove_file(&path).ok();
    }
}
