use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::store::{BranchCounters, CounterStore, Field, MemoryCounterStore, StoreError};

/// Counter store with failure injection.
///
/// Wraps a [`MemoryCounterStore`] and can be scripted to fail the next `n`
/// operations with [`StoreError::Unavailable`].
#[derive(Default)]
pub struct FlakyCounterStore {
    inner: MemoryCounterStore,
    fail_remaining: AtomicUsize,
}

impl FlakyCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `n` store operations to fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    fn maybe_fail(&self) -> Result<(), StoreError> {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("scripted outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for FlakyCounterStore {
    async fn increment(&self, branch: &str, field: Field, delta: i64) -> Result<i64, StoreError> {
        self.maybe_fail()?;
        self.inner.increment(branch, field, delta).await
    }

    async fn snapshot(&self, branch: &str) -> Result<BranchCounters, StoreError> {
        self.maybe_fail()?;
        self.inner.snapshot(branch).await
    }

    async fn initialize(&self, branch: &str) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.initialize(branch).await
    }

    async fn reset(&self, branch: &str) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.reset(branch).await
    }

    async fn wipe_all(&self) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.wipe_all().await
    }
}
