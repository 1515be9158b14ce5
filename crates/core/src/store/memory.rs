//! In-process counter store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{BranchCounters, CounterStore, Field, StoreError};

/// In-memory counter store backed by a mutex-guarded map.
///
/// The default backend. State does not survive a restart; queue counters
/// are day-scoped and a fresh start is an acceptable outcome.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    branches: Mutex<HashMap<String, BranchCounters>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, BranchCounters>>, StoreError> {
        self.branches
            .lock()
            .map_err(|_| StoreError::Unavailable("counter map poisoned".to_string()))
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, branch: &str, field: Field, delta: i64) -> Result<i64, StoreError> {
        let mut branches = self.lock()?;
        let counters = branches.entry(branch.to_string()).or_default();
        let value = counters.get(field) + delta;
        counters.set(field, value);
        Ok(value)
    }

    async fn snapshot(&self, branch: &str) -> Result<BranchCounters, StoreError> {
        let branches = self.lock()?;
        Ok(branches.get(branch).copied().unwrap_or_default())
    }

    async fn initialize(&self, branch: &str) -> Result<(), StoreError> {
        let mut branches = self.lock()?;
        branches.insert(branch.to_string(), BranchCounters::default());
        Ok(())
    }

    async fn reset(&self, branch: &str) -> Result<(), StoreError> {
        let mut branches = self.lock()?;
        branches.insert(branch.to_string(), BranchCounters::default());
        Ok(())
    }

    async fn wipe_all(&self) -> Result<(), StoreError> {
        let mut branches = self.lock()?;
        branches.clear();
        Ok(())
    }
}
