use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::notify::{Pager, PagerError};

/// Mock paging transport: scripted failures, recorded calls.
#[derive(Default)]
pub struct MockPager {
    /// Number of upcoming sends that will fail.
    fail_remaining: AtomicUsize,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockPager {
    /// A pager where every send succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pager whose next `n` sends fail, then succeed.
    pub fn failing_times(n: usize) -> Self {
        let pager = Self::default();
        pager.fail_remaining.store(n, Ordering::SeqCst);
        pager
    }

    /// Script the next `n` sends to fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// All `(to, message)` pairs attempted so far, including failed ones.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pager for MockPager {
    async fn send(&self, to: &str, message: &str) -> Result<(), PagerError> {
        self.calls
            .lock()
            .unwrap()
            .push((to.to_string(), message.to_string()));

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(PagerError::Transport("scripted failure".to_string()));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
