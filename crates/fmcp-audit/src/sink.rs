//! Append-only NDJSON writer.
//!
//! The file is opened lazily on the first write. Once a write through the
//! kept handle fails, the handle is dropped and every later line is appended
//! by a one-shot open/append/close.
//!
//! Writes are synchronous on the caller's thread. Each entry is a single
//! unbuffered `write` to an append-mode file, one per settled request, and
//! the line is on disk when [`AuditSink::record`] returns.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::entry::{AuditEntry, AuditEvent};

/// Audit destination. A sink without a path ignores every call.
#[derive(Debug)]
pub struct AuditSink {
    path: Option<PathBuf>,
    handle: Mutex<Option<File>>,
    stream_failed: Mutex<bool>,
}

impl AuditSink {
    /// Sink writing to `path`, or a no-op sink when `None`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            handle: Mutex::new(None),
            stream_failed: Mutex::new(false),
        }
    }

    /// Sink that never writes.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Whether a path is configured.
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Configured path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record a settled request.
    pub fn tool(&self, method: &str, error: Option<String>, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.record(&AuditEntry::tool(method, error, duration_ms));
    }

    /// Record a plugin connect or disconnect.
    pub fn connection(&self, event: AuditEvent) {
        self.record(&AuditEntry::new(event));
    }

    /// Record a bridge-level failure.
    pub fn error(&self, message: impl Into<String>) {
        self.record(&AuditEntry::error(message));
    }

    /// Append one entry. Never fails.
    pub fn record(&self, entry: &AuditEntry) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let Ok(mut line) = serde_json::to_string(entry) else {
            return;
        };
        line.push('\n');

        if !*self.stream_failed.lock() && self.write_stream(path, line.as_bytes()) {
            return;
        }
        append_once(path, line.as_bytes());
    }

    fn write_stream(&self, path: &Path, bytes: &[u8]) -> bool {
        let mut guard = self.handle.lock();
        if guard.is_none() {
            match open_append(path) {
                Ok(file) => *guard = Some(file),
                Err(error) => {
                    debug!(?path, %error, "audit log open failed");
                    return false;
                }
            }
        }
        let Some(file) = guard.as_mut() else {
            return false;
        };
        match file.write_all(bytes) {
            Ok(()) => true,
            Err(error) => {
                debug!(?path, %error, "audit stream failed, falling back to per-write append");
                *guard = None;
                *self.stream_failed.lock() = true;
                false
            }
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn append_once(path: &Path, bytes: &[u8]) {
    if let Err(error) = open_append(path).and_then(|mut f| f.write_all(bytes)) {
        debug!(?path, %error, "audit append failed");
    }
}
