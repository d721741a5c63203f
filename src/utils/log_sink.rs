//! Per-call log capture.
//!
//! Every indexing operation takes a `&mut LogSink` and appends what it did.
//! Callers that build diagnostics keep the records; everyone else can ignore
//! them, since each record is also forwarded to the `log` facade.

use log::Level;
use std::fmt;

const LOG_TARGET: &str = "mediaidx";

/// One entry in a [`LogSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Ordered collection of log records for a single operation
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    records: Vec<LogRecord>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Level::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    fn push(&mut self, level: Level, message: String) {
        log::log!(target: LOG_TARGET, level, "{}", message);
        self.records.push(LogRecord { level, message });
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Records at error level only
    pub fn errors(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter().filter(|r| r.level == Level::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records.iter().any(|r| r.message.contains(needle))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take all records, leaving the sink empty
    pub fn drain(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_keep_order_and_level() {
        let mut log = LogSink::new();
        log.info("first");
        log.error("second");
        log.warn("third");

        let levels: Vec<_> = log.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![Level::Info, Level::Error, Level::Warn]);
        assert!(log.has_errors());
        assert_eq!(log.errors().count(), 1);
        assert!(log.contains("sec"));
    }

    #[test]
    fn test_drain_empties_sink() {
        let mut log = LogSink::new();
        log.info("x");
        let drained = log.drain();
        assert_eq!(drained.len(), 1);
        assert!(log.is_empty());
        assert!(!log.has_errors());
    }

    #[test]
    fn test_display() {
        let record = LogRecord {
            level: Level::Warn,
            message: "careful".to_string(),
        };
        assert_eq!(record.to_string(), "[WARN] careful");
    }
}
