//! SQLite-backed counter store.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::{BranchCounters, CounterStore, Field, StoreError};

/// SQLite-backed counter store, one row per branch.
///
/// Each increment is a single-statement `UPDATE ... RETURNING`, which
/// SQLite runs in its own implicit transaction. That gives exactly the
/// per-field atomicity the [`CounterStore`] contract asks for and nothing
/// more: two increments of different fields never see each other's
/// transaction.
pub struct SqliteCounterStore {
    conn: Mutex<Connection>,
}

impl SqliteCounterStore {
    /// Open (creating if needed) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, useful for testing.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS branch_counters (
                branch TEXT PRIMARY KEY,
                issued INTEGER NOT NULL DEFAULT 0,
                serving INTEGER NOT NULL DEFAULT 0,
                waiting INTEGER NOT NULL DEFAULT 0,
                served INTEGER NOT NULL DEFAULT 0,
                skipped INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))
    }
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    async fn increment(&self, branch: &str, field: Field, delta: i64) -> Result<i64, StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR IGNORE INTO branch_counters (branch) VALUES (?1)",
            params![branch],
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Field names come from the fixed Field enum, never from input.
        let sql = format!(
            "UPDATE branch_counters SET {field} = {field} + ?1 WHERE branch = ?2 RETURNING {field}",
            field = field.as_str()
        );
        conn.query_row(&sql, params![delta, branch], |row| row.get(0))
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn snapshot(&self, branch: &str) -> Result<BranchCounters, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT issued, serving, waiting, served, skipped
             FROM branch_counters WHERE branch = ?1",
            params![branch],
            |row| {
                Ok(BranchCounters {
                    issued: row.get(0)?,
                    serving: row.get(1)?,
                    waiting: row.get(2)?,
                    served: row.get(3)?,
                    skipped: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(|e| StoreError::Unavailable(e.to_string()))
        .map(|counters| counters.unwrap_or_default())
    }

    async fn initialize(&self, branch: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO branch_counters (branch) VALUES (?1)
             ON CONFLICT(branch) DO UPDATE SET
                 issued = 0, serving = 0, waiting = 0, served = 0, skipped = 0",
            params![branch],
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn reset(&self, branch: &str) -> Result<(), StoreError> {
        self.initialize(branch).await
    }

    async fn wipe_all(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM branch_counters", [])
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_creates_row_on_demand() {
        let store = SqliteCounterStore::in_memory().unwrap();
        assert_eq!(store.increment("b1", Field::Waiting, 1).await.unwrap(), 1);
        assert_eq!(store.increment("b1", Field::Waiting, 1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn negative_delta_applies() {
        let store = SqliteCounterStore::in_memory().unwrap();
        store.increment("b1", Field::Waiting, 3).await.unwrap();
        assert_eq!(store.increment("b1", Field::Waiting, -1).await.unwrap(), 2);
        // The store itself allows going below zero; correction is the
        // engine's job.
        store.increment("b1", Field::Waiting, -5).await.unwrap();
        assert_eq!(store.snapshot("b1").await.unwrap().waiting, -3);
    }

    #[tokio::test]
    async fn snapshot_of_missing_branch_is_zeroed() {
        let store = SqliteCounterStore::in_memory().unwrap();
        assert_eq!(
            store.snapshot("ghost").await.unwrap(),
            BranchCounters::default()
        );
    }

    #[tokio::test]
    async fn initialize_resets_existing_branch() {
        let store = SqliteCounterStore::in_memory().unwrap();
        store.increment("b1", Field::Issued, 9).await.unwrap();
        store.initialize("b1").await.unwrap();
        assert_eq!(store.snapshot("b1").await.unwrap(), BranchCounters::default());
    }

    #[tokio::test]
    async fn wipe_all_removes_rows() {
        let store = SqliteCounterStore::in_memory().unwrap();
        store.increment("b1", Field::Issued, 1).await.unwrap();
        store.increment("b2", Field::Issued, 1).await.unwrap();
        store.wipe_all().await.unwrap();
        assert_eq!(store.snapshot("b1").await.unwrap().issued, 0);
        assert_eq!(store.snapshot("b2").await.unwrap().issued, 0);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");

        {
            let store = SqliteCounterStore::new(&path).unwrap();
            store.increment("b1", Field::Issued, 4).await.unwrap();
        }

        let store = SqliteCounterStore::new(&path).unwrap();
        assert_eq!(store.snapshot("b1").await.unwrap().issued, 4);
    }
}
