//! Audit output for convergence runs via a pluggable sink.
//!
//! Implement [`AuditSink`] to ship per-target deltas and per-run statistics
//! to a log pipeline or metrics backend, then attach it with
//! [`crate::AclConverger::with_audit_sink`]. Without a sink, records are
//! dropped.
//!
//! ```ignore
//! use chef_acl_core::audit::{AuditRecord, AuditSink, ConvergeStats};
//!
//! struct PrintSink;
//!
//! impl AuditSink for PrintSink {
//!     fn on_target_updated(&self, record: &AuditRecord) {
//!         println!("{}: {}", record.acl_path, serde_json::to_string(&record.delta).unwrap());
//!     }
//! }
//! ```

use std::time::Duration;

use serde::Serialize;

use crate::types::AclDelta;

/// One changed ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Logical path of the target, e.g. `/organizations/foo/nodes/x`.
    pub path: String,
    /// Server path of the ACL document.
    pub acl_path: String,
    pub delta: AclDelta,
    /// The change was computed but not written.
    pub dry_run: bool,
}

/// Time spent per phase of a run, summed over all targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvergePhases {
    pub resolve: Duration,
    pub fetch: Duration,
    pub merge: Duration,
    pub persist: Duration,
}

impl ConvergePhases {
    pub fn total(&self) -> Duration {
        self.resolve + self.fetch + self.merge + self.persist
    }
}

/// Summary of one [`crate::AclConverger::converge`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergeStats {
    pub path: String,
    pub targets: usize,
    pub updated: usize,
    pub failed: usize,
    pub duration: Duration,
    pub phases: ConvergePhases,
}

/// Receiver of audit output. Called synchronously from the converging
/// thread, so implementations should return quickly.
pub trait AuditSink: Send + Sync {
    /// Called for every target whose ACL changed (or would change in dry-run mode).
    fn on_target_updated(&self, record: &AuditRecord);

    /// Called once at the end of each run.
    fn on_converge(&self, _stats: &ConvergeStats) {}
}

/// Default sink; discards everything.
pub(crate) struct NoOpSink;

impl AuditSink for NoOpSink {
    fn on_target_updated(&self, _record: &AuditRecord) {}
}
