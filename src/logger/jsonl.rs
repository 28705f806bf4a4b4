//! JSONL activity log: one self-contained JSON object per line.
//!
//! The dashboard owns the terminal, so diagnostics go here instead of stdout.
//! Lines are assembled in memory, written with a single `write_all` and
//! flushed at once, so a concurrent `tail -f` sees every record whole and as
//! soon as it is logged.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. stderr with `[VSP-JSONL]` prefix (only when `stderr_fallback` is set)
//! 3. Silent discard (logging never takes the dashboard down)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{Result, VesperError};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Portal activity events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DashboardStart,
    DashboardStop,
    StoreConnected,
    StoreUnavailable,
    ViewSwitch,
    PollIntervalChanged,
    QueryFailed,
    HistoryCleared,
    ClearFailed,
}

/// A single JSONL log entry; all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    /// Row count affected or observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
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
            view: None,
            interval_ms: None,
            count: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Attach a coded error.
    #[must_use]
    pub fn with_error(mut self, err: &VesperError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.error_message = Some(err.to_string());
        self
    }

    #[must_use]
    pub fn with_view(mut self, view: &str) -> Self {
        self.view = Some(view.to_string());
        self
    }

    #[must_use]
    pub fn with_interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
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
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Maximum file size before rotation (bytes).
    pub max_size_bytes: u64,
    /// Number of rotated files to keep.
    pub max_rotated_files: u32,
    /// Fall back to stderr when the file cannot be written.
    pub stderr_fallback: bool,
}

impl JsonlConfig {
    /// Build writer settings from the `[logging]` config section.
    #[must_use]
    pub fn from_logging(cfg: &LoggingConfig, stderr_fallback: bool) -> Self {
        Self {
            path: cfg.activity_log.clone(),
            max_size_bytes: cfg.max_size_bytes,
            max_rotated_files: cfg.max_rotated_files,
            stderr_fallback,
        }
    }
}

/// Append-only JSONL writer with size rotation.
pub struct JsonlWriter {
    config: Option<JsonlConfig>,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, falling through the degradation chain on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config: Some(config),
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        w.try_open_primary();
        w
    }

    /// A writer that drops everything.
    pub fn disabled() -> Self {
        Self {
            config: None,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    /// Write a single entry as one JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        if self.state == WriterState::Discard {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[VSP-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Flush buffers.
    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        let max_size = self.config.as_ref().map_or(u64::MAX, |c| c.max_size_bytes);
        if self.state == WriterState::Normal && self.bytes_written + line.len() as u64 > max_size {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let written = self.writer.as_mut().is_some_and(|w| {
                    w.write_all(line.as_bytes()).and_then(|()| w.flush()).is_ok()
                });
                if written {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[VSP-JSONL] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        match open_append(&config.path) {
            Ok((file, size)) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
                self.bytes_written = size;
            }
            Err(e) => {
                self.state = WriterState::Normal;
                self.degrade_with(&e.to_string());
            }
        }
    }

    fn degrade(&mut self) {
        self.degrade_with("write failed");
    }

    fn degrade_with(&mut self, reason: &str) {
        self.writer = None;
        let stderr_fallback = self.config.as_ref().is_some_and(|c| c.stderr_fallback);
        self.state = match self.state {
            WriterState::Normal if stderr_fallback => {
                let _ = writeln!(
                    io::stderr(),
                    "[VSP-JSONL] activity log unavailable ({reason}), using stderr"
                );
                WriterState::Stderr
            }
            _ => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let Some(config) = self.config.clone() else {
            return;
        };
        let base = &config.path;

        // Shift existing rotations: .N-1 → .N, …, .1 → .2, current → .1
        for i in (1..config.max_rotated_files).rev() {
            let _ = rename(rotated_name(base, i), rotated_name(base, i + 1));
        }
        if config.max_rotated_files == 0 {
            let _ = fs::remove_file(base);
        } else {
            let _ = rename(base, rotated_name(base, 1));
        }

        match open_append(base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| VesperError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| VesperError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// Build a rotated filename: `portal.jsonl` → `portal.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
