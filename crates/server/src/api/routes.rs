use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{branches, handlers, middleware::auth_middleware, middleware::metrics_middleware, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Surfaces that must stay reachable without credentials.
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    let protected_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/branches/{id}/queue", get(branches::get_queue))
        .route("/branches/{id}/queue", post(branches::initialize_queue))
        .route("/branches/{id}/queue/reset", post(branches::reset_queue))
        .route("/admin/wipe", post(branches::wipe_all))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        // WebSocket handshake does its own token check before upgrading.
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
