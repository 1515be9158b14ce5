use std::sync::Arc;

use waitline_core::{
    Config, NotificationDispatcher, QueueEngine, SanitizedConfig, TokenVerifier,
};

use crate::broadcast::BranchBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    verifier: Arc<dyn TokenVerifier>,
    engine: Arc<QueueEngine>,
    dispatcher: NotificationDispatcher,
    broadcaster: BranchBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        verifier: Arc<dyn TokenVerifier>,
        engine: Arc<QueueEngine>,
        dispatcher: NotificationDispatcher,
        broadcaster: BranchBroadcaster,
    ) -> Self {
        Self {
            config,
            verifier,
            engine,
            dispatcher,
            broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.verifier.as_ref()
    }

    pub fn engine(&self) -> &QueueEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn broadcaster(&self) -> &BranchBroadcaster {
        &self.broadcaster
    }
}
