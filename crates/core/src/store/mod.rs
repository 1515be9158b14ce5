//! Queue state storage.
//!
//! Each branch owns a record of five counters. The only mutation primitive
//! a backend has to provide is an atomic single-field increment; no
//! transaction ever spans more than one field. Everything above this layer
//! (the queue engine) is built out of that primitive plus explicit
//! correction logic.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryCounterStore;
pub use sqlite::SqliteCounterStore;
pub use traits::{CounterStore, StoreError};

use crate::config::{StoreBackend, StoreConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five per-branch counter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Total tickets ever issued. Monotonically non-decreasing.
    Issued,
    /// Ticket number currently being served (0 = none yet).
    Serving,
    /// Tickets issued but not yet called.
    Waiting,
    /// Tickets marked finished.
    Served,
    /// Tickets marked skipped.
    Skipped,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Issued,
        Field::Serving,
        Field::Waiting,
        Field::Served,
        Field::Skipped,
    ];

    /// Column / hash-key name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Issued => "issued",
            Field::Serving => "serving",
            Field::Waiting => "waiting",
            Field::Served => "served",
            Field::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field snapshot of one branch record.
///
/// Produced by [`CounterStore::snapshot`]; see the caveat there about
/// mutual consistency of the five values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCounters {
    pub issued: i64,
    pub serving: i64,
    pub waiting: i64,
    pub served: i64,
    pub skipped: i64,
}

impl BranchCounters {
    pub fn get(&self, field: Field) -> i64 {
        match field {
            Field::Issued => self.issued,
            Field::Serving => self.serving,
            Field::Waiting => self.waiting,
            Field::Served => self.served,
            Field::Skipped => self.skipped,
        }
    }

    pub fn set(&mut self, field: Field, value: i64) {
        match field {
            Field::Issued => self.issued = value,
            Field::Serving => self.serving = value,
            Field::Waiting => self.waiting = value,
            Field::Served => self.served = value,
            Field::Skipped => self.skipped = value,
        }
    }
}

/// Factory function to create a counter store from config.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn CounterStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Box::new(MemoryCounterStore::new())),
        StoreBackend::Sqlite => {
            let path = config.path.as_ref().ok_or_else(|| {
                StoreError::Backend("store.path must be set when backend = \"sqlite\"".to_string())
            })?;
            Ok(Box::new(SqliteCounterStore::new(path)?))
        }
    }
}
