//! HTTP paging transport.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{Pager, PagerError};

/// Pager that POSTs messages to a Twilio-style HTTP gateway.
pub struct HttpPager {
    client: reqwest::Client,
    url: String,
    from: String,
    auth_token: Option<String>,
}

#[derive(Serialize)]
struct PageRequest<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

impl HttpPager {
    pub fn new(url: String, from: String, auth_token: Option<String>, timeout_secs: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url,
            from,
            auth_token,
        }
    }
}

#[async_trait]
impl Pager for HttpPager {
    async fn send(&self, to: &str, message: &str) -> Result<(), PagerError> {
        let mut request = self.client.post(&self.url).json(&PageRequest {
            to,
            from: &self.from,
            body: message,
        });
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PagerError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PagerError::Rejected(format!(
                "gateway returned {}",
                response.status()
            )))
        }
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
