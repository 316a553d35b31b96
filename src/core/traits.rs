//! Core traits for the ledger
//!
//! The registry reports every completed operation through an [`AuditSink`].
//! Implementations decide whether and how events are persisted; the registry
//! makes no assumption about durability.

use crate::audit::AuditEvent;

/// Receiver for per-operation audit events
///
/// Invoked exactly once per operation executed through the registry, whether
/// it committed or failed. Called from whichever thread ran the operation,
/// after every account lock has been released, so implementations must be
/// thread-safe but may block briefly.
pub trait AuditSink: Send + Sync {
    /// Record one completed operation
    fn record(&self, event: &AuditEvent);
}
