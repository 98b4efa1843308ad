//! JSONL activity log: append-only line-delimited JSON of session events.
//!
//! Each line is a self-contained JSON object written with a single
//! `write_all`, so a tailing process never sees a partial line.
//!
//! Three-level fallback chain:
//! 1. Configured file path
//! 2. stderr with `[MREG-JSONL]` prefix
//! 3. Silent discard (the session never stops for logging failures)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{RegistryError, Result};

/// Severity level for log events, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Session activity recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    SessionStop,
    DeviceAdded,
    DeviceSelected,
    MeasuringStarted,
    MeasuringStopped,
    MeasurementSet,
    MeasurementRejected,
    AttributeChanged,
    CommandRejected,
}

/// A single JSONL log entry; only `ts`, `event`, and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Zero-based position of the device in the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_index: Option<usize>,
    /// `temperature` or `advanced_temperature`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Numeric value involved (measurement, offset, bound).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// MREG error code when the action was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            device_index: None,
            device_kind: None,
            device_name: None,
            value: None,
            error_code: None,
            details: None,
        }
    }

    /// Entry describing a rejected action, carrying the error code and message.
    pub fn rejected(event: EventType, error: &RegistryError) -> Self {
        Self::from_error(event, Severity::Warning, error)
    }

    /// Entry describing a failure that ended the session.
    pub fn fatal(event: EventType, error: &RegistryError) -> Self {
        Self::from_error(event, Severity::Critical, error)
    }

    fn from_error(event: EventType, severity: Severity, error: &RegistryError) -> Self {
        let mut entry = Self::new(event, severity);
        entry.error_code = Some(error.code().to_string());
        entry.details = Some(error.to_string());
        entry
    }

    #[must_use]
    pub fn with_device(mut self, index: usize, kind: &str, name: &str) -> Self {
        self.device_index = Some(index);
        self.device_kind = Some(kind.to_string());
        self.device_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Degradation state of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    File,
    Stderr,
    Discard,
}

/// Append-only JSONL activity writer with severity filtering and fallback.
pub struct ActivityLog {
    path: Option<PathBuf>,
    file: Option<File>,
    state: WriterState,
    min_severity: Severity,
    entries_written: u64,
}

impl ActivityLog {
    /// Open the log at `path`, falling through the degradation chain on failure.
    pub fn open(path: &Path, min_severity: Severity) -> Self {
        let mut log = Self {
            path: Some(path.to_path_buf()),
            file: None,
            state: WriterState::Discard,
            min_severity,
            entries_written: 0,
        };
        match open_append(path) {
            Ok(file) => {
                log.file = Some(file);
                log.state = WriterState::File;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "[MREG-JSONL] {e}, using stderr");
                log.state = WriterState::Stderr;
            }
        }
        log
    }

    /// Log that writes every entry to stderr.
    pub fn stderr(min_severity: Severity) -> Self {
        Self {
            path: None,
            file: None,
            state: WriterState::Stderr,
            min_severity,
            entries_written: 0,
        }
    }

    /// Log that drops every entry.
    pub fn disabled() -> Self {
        Self {
            path: None,
            file: None,
            state: WriterState::Discard,
            min_severity: Severity::Critical,
            entries_written: 0,
        }
    }

    /// Write a single entry as one JSONL line if it meets the severity floor.
    pub fn record(&mut self, entry: &LogEntry) {
        if entry.severity < self.min_severity || self.state == WriterState::Discard {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[MREG-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Current degradation state.
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::File => "file",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Configured file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of entries accepted by the current sink.
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::File => {
                let written = self
                    .file
                    .as_mut()
                    .is_some_and(|f| f.write_all(line.as_bytes()).is_ok());
                if written {
                    self.entries_written += 1;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[MREG-JSONL] {line}").is_ok() {
                    self.entries_written += 1;
                } else {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.file = None;
        self.state = match self.state {
            WriterState::File => {
                let _ = writeln!(io::stderr(), "[MREG-JSONL] file write failed, using stderr");
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }
}

/// Open or create a file for appending, creating parent directories.
fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| RegistryError::io(parent, source))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| RegistryError::io(path, source))
}

/// Format current UTC time as RFC 3339 with millisecond precision.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
