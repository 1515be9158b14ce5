use async_trait::async_trait;
use thiserror::Error;

use super::{BranchCounters, Field};

/// Errors from a counter store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or failing. The operation in progress must be
    /// aborted and surfaced to the caller; the store may have applied a
    /// partial increment before failing.
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),

    /// Backend misconfiguration (bad path, missing settings).
    #[error("Counter store backend error: {0}")]
    Backend(String),
}

/// Per-branch counter storage.
///
/// The atomicity contract is per single field: `increment` applies its
/// delta and returns the resulting value atomically with respect to other
/// increments of the *same* field. There is deliberately no multi-field
/// transaction; composite queue transitions are the engine's problem.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically apply `delta` to one field of a branch record and return
    /// the value after the change. A branch that was never initialized
    /// behaves as all-zero.
    async fn increment(&self, branch: &str, field: Field, delta: i64) -> Result<i64, StoreError>;

    /// Read all five fields of a branch record.
    ///
    /// The fields are read individually, so the returned values are the
    /// best available per-field snapshot and are not guaranteed to be
    /// mutually consistent when reads race concurrent increments.
    async fn snapshot(&self, branch: &str) -> Result<BranchCounters, StoreError>;

    /// Create the branch record with all fields zeroed. Idempotent on an
    /// already-zeroed branch; resets counters if the branch already exists.
    async fn initialize(&self, branch: &str) -> Result<(), StoreError>;

    /// Zero all fields of one branch record.
    async fn reset(&self, branch: &str) -> Result<(), StoreError>;

    /// Remove every branch record. Administrative/test use only.
    async fn wipe_all(&self) -> Result<(), StoreError>;
}
