//! Queue engine operations and invariants.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::store::{CounterStore, Field, StoreError};

use super::{BranchState, CallOutcome, FinishOutcome, IssuedTicket, SkipOutcome};

/// Default bound on a single engine operation.
pub(crate) const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from queue engine operations.
///
/// An empty queue is *not* an error; it is the
/// [`CallOutcome::EmptyQueue`] result variant.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The counter store failed. Surfaced verbatim; the engine never
    /// retries, and never fabricates a ticket number in place of one.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A store call did not complete within the operation bound.
    #[error("queue operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Orchestrates queue transitions over the per-field-atomic counter store.
///
/// All operations on one branch are serialized behind a per-branch async
/// mutex, so a composite transition (decrement, correct, increment) is
/// atomic from the point of view of other in-process callers. Different
/// branches run fully concurrently. The waiting-correction step is kept
/// even under the lock: a SQLite file shared with another process can
/// still race us, and correction restores `waiting >= 0` either way.
///
/// Finish and skip echo the caller-supplied ticket number without checking
/// it against the serving position; the agent client is trusted.
pub struct QueueEngine {
    store: Arc<dyn CounterStore>,
    op_timeout: Duration,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self::with_timeout(store, DEFAULT_OP_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<dyn CounterStore>, op_timeout: Duration) -> Self {
        Self {
            store,
            op_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn branch_lock(&self, branch: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(branch.to_string()).or_default())
    }

    async fn incr(&self, branch: &str, field: Field, delta: i64) -> Result<i64, EngineError> {
        timeout(self.op_timeout, self.store.increment(branch, field, delta))
            .await
            .map_err(|_| EngineError::Timeout(self.op_timeout))?
            .map_err(EngineError::from)
    }

    /// Issue a new ticket: join the waiting line, then take the next
    /// number in the issuance sequence.
    pub async fn issue(&self, branch: &str) -> Result<IssuedTicket, EngineError> {
        let lock = self.branch_lock(branch);
        let _guard = lock.lock().await;

        let waiting = self.incr(branch, Field::Waiting, 1).await?;
        let number = self.incr(branch, Field::Issued, 1).await?;

        tracing::debug!(branch, number, waiting, "ticket issued");

        Ok(IssuedTicket {
            number,
            waiting,
            // With exactly one ticket waiting, this ticket is first in line.
            next: (waiting == 1).then_some(number),
        })
    }

    /// Call the next waiting ticket. With `finished_previous`, the ticket
    /// the agent just handled is counted as served first (independent
    /// bookkeeping; does not gate the call itself).
    pub async fn call_next(
        &self,
        branch: &str,
        finished_previous: bool,
    ) -> Result<CallOutcome, EngineError> {
        let lock = self.branch_lock(branch);
        let _guard = lock.lock().await;

        if finished_previous {
            self.incr(branch, Field::Served, 1).await?;
        }

        let waiting = self.incr(branch, Field::Waiting, -1).await?;

        if waiting < 0 {
            // Nobody was actually waiting (or a concurrent caller on a
            // shared store decremented past zero). Restore the invariant
            // and report an empty queue; serving stays where it was.
            self.incr(branch, Field::Waiting, -waiting).await?;
            tracing::debug!(branch, "call on empty queue");
            return Ok(CallOutcome::EmptyQueue);
        }

        let serving = self.incr(branch, Field::Serving, 1).await?;

        tracing::debug!(branch, serving, waiting, "ticket called");

        Ok(CallOutcome::Served {
            serving,
            waiting,
            next: (waiting > 0).then_some(serving + 1),
        })
    }

    /// Record a finished ticket without calling a new one.
    pub async fn finish(&self, branch: &str, ticket: i64) -> Result<FinishOutcome, EngineError> {
        let lock = self.branch_lock(branch);
        let _guard = lock.lock().await;

        let served = self.incr(branch, Field::Served, 1).await?;
        Ok(FinishOutcome { served, ticket })
    }

    /// Record a skipped ticket.
    pub async fn skip(&self, branch: &str, ticket: i64) -> Result<SkipOutcome, EngineError> {
        let lock = self.branch_lock(branch);
        let _guard = lock.lock().await;

        let skipped = self.incr(branch, Field::Skipped, 1).await?;
        Ok(SkipOutcome { skipped, ticket })
    }

    /// Read the full queue state of a branch. Used to seed newly connected
    /// clients and for dashboards.
    pub async fn branch_state(&self, branch: &str) -> Result<BranchState, EngineError> {
        let counters = timeout(self.op_timeout, self.store.snapshot(branch))
            .await
            .map_err(|_| EngineError::Timeout(self.op_timeout))??;
        Ok(counters.into())
    }

    /// Provision (or re-zero) a branch record.
    pub async fn initialize(&self, branch: &str) -> Result<(), EngineError> {
        let lock = self.branch_lock(branch);
        let _guard = lock.lock().await;

        timeout(self.op_timeout, self.store.initialize(branch))
            .await
            .map_err(|_| EngineError::Timeout(self.op_timeout))??;
        tracing::info!(branch, "branch queue initialized");
        Ok(())
    }

    /// Zero one branch record.
    pub async fn reset(&self, branch: &str) -> Result<(), EngineError> {
        let lock = self.branch_lock(branch);
        let _guard = lock.lock().await;

        timeout(self.op_timeout, self.store.reset(branch))
            .await
            .map_err(|_| EngineError::Timeout(self.op_timeout))??;
        tracing::info!(branch, "branch queue reset");
        Ok(())
    }

    /// Clear every branch record. Administrative/test use only.
    pub async fn wipe_all(&self) -> Result<(), EngineError> {
        timeout(self.op_timeout, self.store.wipe_all())
            .await
            .map_err(|_| EngineError::Timeout(self.op_timeout))??;
        tracing::warn!("all branch queues wiped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::format_ticket;
    use crate::store::MemoryCounterStore;
    use crate::testing::FlakyCounterStore;

    fn engine() -> QueueEngine {
        QueueEngine::new(Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn issue_assigns_consecutive_numbers() {
        let engine = engine();
        for expected in 1..=5 {
            let ticket = engine.issue("b1").await.unwrap();
            assert_eq!(ticket.number, expected);
            assert_eq!(ticket.waiting, expected);
        }
        let state = engine.branch_state("b1").await.unwrap();
        assert_eq!(state.issued, 5);
        assert_eq!(state.waiting, 5);
    }

    #[tokio::test]
    async fn first_ticket_is_next_in_line() {
        let engine = engine();

        let first = engine.issue("b1").await.unwrap();
        assert_eq!(first.next, Some(first.number));

        let second = engine.issue("b1").await.unwrap();
        assert_eq!(second.next, None);
    }

    #[tokio::test]
    async fn call_next_on_empty_queue_is_a_noop() {
        let engine = engine();

        let outcome = engine.call_next("b1", false).await.unwrap();
        assert_eq!(outcome, CallOutcome::EmptyQueue);

        // Correction restored the invariant and serving did not move.
        let state = engine.branch_state("b1").await.unwrap();
        assert_eq!(state.waiting, 0);
        assert_eq!(state.serving, 0);
    }

    #[tokio::test]
    async fn issue_then_call_round_trip() {
        let engine = engine();

        let ticket = engine.issue("b1").await.unwrap();
        assert_eq!(ticket.waiting, 1);

        match engine.call_next("b1", false).await.unwrap() {
            CallOutcome::Served { serving, waiting, next } => {
                assert_eq!(serving, ticket.number);
                assert_eq!(waiting, 0);
                assert_eq!(next, None);
            }
            CallOutcome::EmptyQueue => panic!("expected a served ticket"),
        }
    }

    /// The scripted walk-through: two issues, three calls.
    #[tokio::test]
    async fn issue_call_scenario() {
        let engine = engine();

        let t1 = engine.issue("b1").await.unwrap();
        assert_eq!(format_ticket(t1.number), "001");
        assert_eq!(t1.waiting, 1);
        assert_eq!(t1.next.map(format_ticket).as_deref(), Some("001"));

        let t2 = engine.issue("b1").await.unwrap();
        assert_eq!(format_ticket(t2.number), "002");
        assert_eq!(t2.waiting, 2);
        assert_eq!(t2.next, None);

        match engine.call_next("b1", false).await.unwrap() {
            CallOutcome::Served { serving, waiting, next } => {
                assert_eq!(format_ticket(serving), "001");
                assert_eq!(waiting, 1);
                assert_eq!(next.map(format_ticket).as_deref(), Some("002"));
            }
            CallOutcome::EmptyQueue => panic!("expected 001 to be served"),
        }

        match engine.call_next("b1", false).await.unwrap() {
            CallOutcome::Served { serving, waiting, next } => {
                assert_eq!(format_ticket(serving), "002");
                assert_eq!(waiting, 0);
                assert_eq!(next, None);
            }
            CallOutcome::EmptyQueue => panic!("expected 002 to be served"),
        }

        assert_eq!(
            engine.call_next("b1", false).await.unwrap(),
            CallOutcome::EmptyQueue
        );
        let state = engine.branch_state("b1").await.unwrap();
        assert_eq!(state.waiting, 0);
        assert_eq!(state.serving, 2);
    }

    #[tokio::test]
    async fn finished_previous_counts_independently() {
        let engine = engine();
        engine.issue("b1").await.unwrap();
        engine.issue("b1").await.unwrap();

        engine.call_next("b1", false).await.unwrap();
        engine.call_next("b1", true).await.unwrap();

        let state = engine.branch_state("b1").await.unwrap();
        assert_eq!(state.served, 1);

        // The served bookkeeping happens even when the call finds nothing.
        assert_eq!(
            engine.call_next("b1", true).await.unwrap(),
            CallOutcome::EmptyQueue
        );
        assert_eq!(engine.branch_state("b1").await.unwrap().served, 2);
    }

    #[tokio::test]
    async fn finish_and_skip_echo_the_supplied_ticket() {
        let engine = engine();

        let finish = engine.finish("b1", 7).await.unwrap();
        assert_eq!(finish.served, 1);
        assert_eq!(finish.ticket, 7);

        let skip = engine.skip("b1", 8).await.unwrap();
        assert_eq!(skip.skipped, 1);
        assert_eq!(skip.ticket, 8);
    }

    #[tokio::test]
    async fn state_query_is_idempotent() {
        let engine = engine();
        engine.issue("b1").await.unwrap();
        engine.issue("b1").await.unwrap();
        engine.call_next("b1", false).await.unwrap();

        let a = engine.branch_state("b1").await.unwrap();
        let b = engine.branch_state("b1").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.next(), Some(2));
    }

    #[tokio::test]
    async fn branches_do_not_interfere() {
        let engine = engine();
        engine.issue("a").await.unwrap();
        engine.issue("a").await.unwrap();
        engine.issue("b").await.unwrap();

        assert_eq!(engine.branch_state("a").await.unwrap().issued, 2);
        assert_eq!(engine.branch_state("b").await.unwrap().issued, 1);
    }

    #[tokio::test]
    async fn concurrent_issues_have_no_gaps_or_repeats() {
        let engine = Arc::new(engine());

        let mut handles = Vec::new();
        for _ in 0..40 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(
                async move { engine.issue("b1").await.unwrap().number },
            ));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=40).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn waiting_never_ends_below_zero() {
        let engine = Arc::new(engine());

        // More callers than tickets, interleaved with issues.
        let mut handles = Vec::new();
        for i in 0..30 {
            let engine = Arc::clone(&engine);
            if i % 3 == 0 {
                handles.push(tokio::spawn(async move {
                    engine.issue("b1").await.unwrap();
                }));
            } else {
                handles.push(tokio::spawn(async move {
                    engine.call_next("b1", false).await.unwrap();
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let state = engine.branch_state("b1").await.unwrap();
        assert!(state.waiting >= 0, "waiting = {}", state.waiting);
        assert!(state.serving <= state.issued);
    }

    #[tokio::test]
    async fn reset_and_wipe_zero_state() {
        let engine = engine();
        engine.issue("a").await.unwrap();
        engine.issue("b").await.unwrap();

        engine.reset("a").await.unwrap();
        assert_eq!(engine.branch_state("a").await.unwrap().issued, 0);
        assert_eq!(engine.branch_state("b").await.unwrap().issued, 1);

        engine.wipe_all().await.unwrap();
        assert_eq!(engine.branch_state("b").await.unwrap().issued, 0);
    }

    #[tokio::test]
    async fn store_failure_surfaces_without_fabricating_a_ticket() {
        let store = Arc::new(FlakyCounterStore::new());
        let engine = QueueEngine::new(Arc::clone(&store) as Arc<dyn CounterStore>);

        store.fail_next(1);
        let result = engine.issue("b1").await;
        assert!(matches!(result, Err(EngineError::Store(_))));

        // The failed operation stopped at the first increment; the
        // issuance sequence itself is untouched.
        store.fail_next(0);
        let ticket = engine.issue("b1").await.unwrap();
        assert_eq!(ticket.number, 1);
    }
}
