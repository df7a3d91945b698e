//! # fmcp-audit
//!
//! Optional compliance log. One JSON object per line (NDJSON) recording tool
//! invocations and plugin connection events. Writing never fails the caller:
//! every I/O error is swallowed.

#![deny(unsafe_code)]

pub mod entry;
pub mod sink;

pub use entry::{AuditEntry, AuditEvent};
pub use sink::AuditSink;
