//! Common test utilities for in-process API testing.
//!
//! The fixture builds the full router over an in-memory counter store and
//! a recording pager, so tests run without external infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use waitline_core::{
    sign_identity, testing::MockPager, AuthConfig, AuthMethod, Config, EngineConfig, Identity,
    JwtVerifier, MemoryCounterStore, NoneVerifier, NotificationDispatcher, PagerConfig,
    QueueEngine, Role, ServerConfig, StoreConfig, TokenVerifier,
};
use waitline_server::broadcast::BranchBroadcaster;
use waitline_server::state::AppState;

/// Signing secret shared by fixture and token helpers.
pub const TEST_SECRET: &str = "integration-test-secret";

/// Test fixture wrapping the router and its injected dependencies.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for driving the engine directly from tests
    pub state: Arc<AppState>,
    /// Recording pager
    pub pager: Arc<MockPager>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with token verification disabled.
    pub fn new() -> Self {
        Self::build(AuthMethod::None)
    }

    /// Fixture with HS256 verification against [`TEST_SECRET`].
    pub fn with_jwt() -> Self {
        Self::build(AuthMethod::Jwt)
    }

    fn build(method: AuthMethod) -> Self {
        let secret = matches!(method, AuthMethod::Jwt).then(|| TEST_SECRET.to_string());
        let config = Config {
            auth: AuthConfig { method, secret },
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            pager: PagerConfig::default(),
            engine: EngineConfig::default(),
        };

        let verifier: Arc<dyn TokenVerifier> = match method {
            AuthMethod::Jwt => Arc::new(JwtVerifier::new(TEST_SECRET.as_bytes())),
            AuthMethod::None => Arc::new(NoneVerifier::new()),
        };

        let pager = Arc::new(MockPager::new());
        let state = Arc::new(AppState::new(
            config,
            verifier,
            Arc::new(QueueEngine::new(Arc::new(MemoryCounterStore::new()))),
            NotificationDispatcher::new(pager.clone()),
            BranchBroadcaster::new(),
        ));

        let router = waitline_server::api::create_router(state.clone());

        Self {
            router,
            state,
            pager,
        }
    }

    /// Sign a short-lived token for the given role, bound to `branch`.
    pub fn token(&self, role: Role, branch: &str) -> String {
        let identity = Identity {
            user_id: format!("test-{:?}", role).to_lowercase(),
            role,
            company_id: "acme".to_string(),
            branch_id: branch.to_string(),
        };
        sign_identity(TEST_SECRET.as_bytes(), &identity, 600).expect("Failed to sign test token")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a GET request carrying a bearer token.
    pub async fn get_auth(&self, path: &str, token: &str) -> TestResponse {
        self.request("GET", path, None, Some(token)).await
    }

    /// Send a POST request with no body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, None, None).await
    }

    /// Send a POST request carrying a bearer token.
    pub async fn post_auth(&self, path: &str, token: &str) -> TestResponse {
        self.request("POST", path, None, Some(token)).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            request_builder = request_builder.header("Authorization", format!("Bearer {token}"));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
