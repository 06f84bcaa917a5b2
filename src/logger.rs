use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

pub mod rotation;

pub use rotation::{BackupSlots, LogRotationState, RotatingLogSink};

const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Log level enum for type-safe logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Label written into the log file
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// A single log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
}

impl LogEntry {
    /// `timestamp - LEVEL - message`
    pub fn format_line(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level.label(),
            self.message
        )
    }
}

/// Simple circular buffer for fixed-size log storage
struct CircularBuffer {
    buffer: Vec<LogEntry>,
    head: usize,
    capacity: usize,
}

impl CircularBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY)),
            head: 0,
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, item: LogEntry) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    fn to_vec(&self) -> Vec<LogEntry> {
        let mut result = Vec::with_capacity(self.buffer.len());
        result.extend_from_slice(&self.buffer[self.head..]);
        result.extend_from_slice(&self.buffer[..self.head]);
        result
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.head = 0;
    }
}

/// Commands for the writer thread
enum LogCommand {
    Log(LogEntry),
    GetLogs(Sender<Vec<LogEntry>>),
    Clear,
    Shutdown,
}

/// Handle used by every pipeline component to write log records.
///
/// Cloning is cheap; all clones feed the same writer thread, which is the only
/// owner of the rotating file sink.
#[derive(Clone)]
pub struct Logger {
    sender: Sender<LogCommand>,
    min_level: Arc<AtomicU8>,
}

/// Keeps the writer thread alive. Dropping it drains the queue and joins the thread.
pub struct LoggerGuard {
    sender: Sender<LogCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Logger {
    /// Start a logger that writes to `sink` (if any) and keeps recent records in memory
    pub fn new(sink: Option<RotatingLogSink>) -> (Self, LoggerGuard) {
        Self::with_capacity(sink, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(sink: Option<RotatingLogSink>, capacity: usize) -> (Self, LoggerGuard) {
        let (sender, receiver) = unbounded();
        let min_level = Arc::new(AtomicU8::new(LogLevel::Debug as u8));

        let handle = std::thread::Builder::new()
            .name("notarizer-log".to_string())
            .spawn(move || Self::writer_thread(receiver, sink, capacity))
            .ok();

        let logger = Self {
            sender: sender.clone(),
            min_level,
        };
        (logger, LoggerGuard { sender, handle })
    }

    /// Logger without a file sink, for tests and one-off tools
    pub fn in_memory() -> (Self, LoggerGuard) {
        Self::new(None)
    }

    fn writer_thread(
        receiver: Receiver<LogCommand>,
        mut sink: Option<RotatingLogSink>,
        capacity: usize,
    ) {
        let mut buffer = CircularBuffer::new(capacity);

        for cmd in receiver {
            match cmd {
                LogCommand::Log(entry) => {
                    if let Some(sink) = sink.as_mut() {
                        sink.emit(&entry.format_line());
                    }
                    buffer.push(entry);
                }
                LogCommand::GetLogs(response_tx) => {
                    let _ = response_tx.send(buffer.to_vec());
                }
                LogCommand::Clear => buffer.clear(),
                LogCommand::Shutdown => break,
            }
        }
    }

    /// Record a message at `level`, tagged with the emitting component
    pub fn log(&self, level: LogLevel, message: &str, source: &str) {
        if (level as u8) < self.min_level.load(Ordering::Relaxed) {
            return;
        }

        match level {
            LogLevel::Error => tracing::error!(target: "notarizer", source, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "notarizer", source, "{}", message),
            LogLevel::Info => tracing::info!(target: "notarizer", source, "{}", message),
            LogLevel::Debug => tracing::debug!(target: "notarizer", source, "{}", message),
        }

        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message: message.to_string(),
            source: source.to_string(),
        };

        if self.sender.send(LogCommand::Log(entry)).is_err() {
            eprintln!("--- Logging error ---\nlog writer stopped, record lost: {}", message);
        }
    }

    pub fn info(&self, message: &str, source: &str) {
        self.log(LogLevel::Info, message, source);
    }

    pub fn warn(&self, message: &str, source: &str) {
        self.log(LogLevel::Warn, message, source);
    }

    pub fn error(&self, message: &str, source: &str) {
        self.log(LogLevel::Error, message, source);
    }

    pub fn debug(&self, message: &str, source: &str) {
        self.log(LogLevel::Debug, message, source);
    }

    /// Set minimum log level (runtime filtering)
    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    /// Recent records, oldest first.
    ///
    /// Every record logged before this call has been handed to the file sink by
    /// the time it returns.
    pub fn get_logs(&self) -> Vec<LogEntry> {
        let (response_tx, response_rx) = bounded(1);
        if self.sender.send(LogCommand::GetLogs(response_tx)).is_ok() {
            response_rx.recv().unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    pub fn clear_logs(&self) {
        let _ = self.sender.send(LogCommand::Clear);
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.sender.send(LogCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Format and log through a [`Logger`] handle
#[macro_export]
macro_rules! app_log {
    ($logger:expr, $level:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $logger.log($level, &message, module_path!());
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("verbose"), None);
        assert!(LogLevel::Error > LogLevel::Info);
    }

    #[test]
    fn test_format_line() {
        let entry = LogEntry {
            timestamp: Local::now(),
            level: LogLevel::Warn,
            message: "disk almost full".to_string(),
            source: "test".to_string(),
        };
        let line = entry.format_line();
        assert!(line.ends_with(" - WARNING - disk almost full"));
        // "YYYY-mm-dd HH:MM:SS,mmm"
        assert_eq!(line.split(" - ").next().unwrap().len(), 23);
    }

    #[test]
    fn test_logs_are_buffered_in_order() {
        let (logger, _guard) = Logger::in_memory();
        logger.info("one", "test");
        logger.error("two", "test");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "one");
        assert_eq!(logs[1].level, LogLevel::Error);
    }

    #[test]
    fn test_min_level_filters() {
        let (logger, _guard) = Logger::in_memory();
        logger.set_min_level(LogLevel::Warn);
        logger.info("ignored", "test");
        logger.warn("kept", "test");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "kept");
        assert_eq!(logger.get_min_level(), LogLevel::Warn);
    }

    #[test]
    fn test_buffer_wraps_at_capacity() {
        let (logger, _guard) = Logger::with_capacity(None, 3);
        for i in 0..5 {
            logger.info(&format!("msg {}", i), "test");
        }

        let messages: Vec<String> = logger.get_logs().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn test_clear_logs() {
        let (logger, _guard) = Logger::in_memory();
        logger.info("something", "test");
        logger.clear_logs();
        assert!(logger.get_logs().is_empty());
    }

    #[test]
    fn test_records_reach_file_sink() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("notarizer.log");
        let sink = RotatingLogSink::open(&log_path, 100, 2).unwrap();

        let (logger, guard) = Logger::new(Some(sink));
        app_log!(logger, LogLevel::Info, "Monitoring directory: {}", "/in");
        drop(guard);

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains(" - INFO - Monitoring directory: /in"));
        assert_eq!(content.lines().count(), 1);
    }
}
