//! Customer paging (SMS) with a fixed retry contract.
//!
//! Paging is best-effort and strictly one-way: a failed page never touches
//! queue state. The transport is pluggable; the retry policy (exactly one
//! retry, then report failure) is part of this crate's contract.

mod http;

pub use http::HttpPager;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{PagerBackend, PagerConfig};

/// Errors from a paging transport attempt.
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("Paging transport error: {0}")]
    Transport(String),

    #[error("Paging rejected: {0}")]
    Rejected(String),
}

/// Error from the dispatcher after its retry budget is spent.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Both the attempt and its single retry failed. The ticket the page
    /// was about remains valid regardless.
    #[error("Paging failed after retry: {0}")]
    Exhausted(PagerError),
}

/// Outbound paging transport.
#[async_trait]
pub trait Pager: Send + Sync {
    /// Deliver one message to one contact address.
    async fn send(&self, to: &str, message: &str) -> Result<(), PagerError>;

    /// Name of this paging backend
    fn backend_name(&self) -> &'static str;
}

/// Transport that drops every page on the floor, successfully.
///
/// Default backend for deployments without an SMS provider.
pub struct NonePager;

#[async_trait]
impl Pager for NonePager {
    async fn send(&self, to: &str, _message: &str) -> Result<(), PagerError> {
        tracing::debug!(to, "paging disabled, message dropped");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

/// Pages customers about their ticket, retrying exactly once.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pager: Arc<dyn Pager>,
}

impl NotificationDispatcher {
    pub fn new(pager: Arc<dyn Pager>) -> Self {
        Self { pager }
    }

    /// Page a customer with their ticket number. One attempt, one retry.
    ///
    /// Failure is reported to the caller only; it is never broadcast and
    /// never reverses the issuance that triggered it.
    pub async fn page_ticket(&self, to: &str, number: i64) -> Result<(), NotifyError> {
        let message = format!("Your number: {}", crate::queue::format_ticket(number));

        let first = match self.pager.send(to, &message).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        tracing::warn!(to, number, error = %first, "page failed, retrying once");

        self.pager
            .send(to, &message)
            .await
            .map_err(|e| {
                tracing::error!(to, number, error = %e, "page failed after retry");
                NotifyError::Exhausted(e)
            })
    }
}

/// Factory function to create a pager from config.
pub fn create_pager(config: &PagerConfig) -> Result<Box<dyn Pager>, PagerError> {
    match config.backend {
        PagerBackend::None => Ok(Box::new(NonePager)),
        PagerBackend::Http => {
            let url = config.url.clone().ok_or_else(|| {
                PagerError::Transport("pager.url must be set when backend = \"http\"".to_string())
            })?;
            let from = config.from.clone().ok_or_else(|| {
                PagerError::Transport("pager.from must be set when backend = \"http\"".to_string())
            })?;
            Ok(Box::new(HttpPager::new(
                url,
                from,
                config.auth_token.clone(),
                config.timeout_secs,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPager;

    #[tokio::test]
    async fn success_pages_exactly_once() {
        let pager = Arc::new(MockPager::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&pager) as Arc<dyn Pager>);

        dispatcher.page_ticket("5551234", 7).await.unwrap();

        let calls = pager.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("5551234".to_string(), "Your number: 007".to_string()));
    }

    #[tokio::test]
    async fn first_failure_triggers_exactly_one_retry() {
        let pager = Arc::new(MockPager::failing_times(1));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&pager) as Arc<dyn Pager>);

        dispatcher.page_ticket("5551234", 3).await.unwrap();
        assert_eq!(pager.calls().len(), 2);
    }

    #[tokio::test]
    async fn double_failure_is_exhausted() {
        let pager = Arc::new(MockPager::failing_times(2));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&pager) as Arc<dyn Pager>);

        let result = dispatcher.page_ticket("5551234", 3).await;
        assert!(matches!(result, Err(NotifyError::Exhausted(_))));
        // No third attempt.
        assert_eq!(pager.calls().len(), 2);
    }

    #[tokio::test]
    async fn none_pager_always_succeeds() {
        let dispatcher = NotificationDispatcher::new(Arc::new(NonePager));
        dispatcher.page_ticket("5551234", 1).await.unwrap();
    }
}
