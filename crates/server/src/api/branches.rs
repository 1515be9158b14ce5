//! Branch queue administration handlers.
//!
//! The query endpoint is open to any verified identity; initialize and
//! reset require at least the manager role, and the full wipe is admin
//! only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use waitline_core::{BranchState, EngineError, Role};

use super::middleware::AuthIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub branch: String,
    #[serde(flatten)]
    pub state: BranchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub branch: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn engine_error(e: EngineError) -> Response {
    warn!(error = %e, "queue operation failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
        .into_response()
}

fn forbidden(required: Role) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody {
            error: format!("requires at least the {:?} role", required),
        }),
    )
        .into_response()
}

/// GET /branches/{id}/queue
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Path(branch): Path<String>,
) -> Response {
    match state.engine().branch_state(&branch).await {
        Ok(branch_state) => Json(QueueResponse {
            branch,
            next: branch_state.next(),
            state: branch_state,
        })
        .into_response(),
        Err(e) => engine_error(e),
    }
}

/// POST /branches/{id}/queue
///
/// Provisions the branch record with all counters at zero, re-zeroing
/// it if it already exists.
pub async fn initialize_queue(
    State(state): State<Arc<AppState>>,
    Path(branch): Path<String>,
    AuthIdentity(identity): AuthIdentity,
) -> Response {
    if !identity.role.is_at_least(Role::Manager) {
        return forbidden(Role::Manager);
    }

    match state.engine().initialize(&branch).await {
        Ok(()) => {
            info!(branch = %branch, user_id = %identity.user_id, "branch queue initialized");
            Json(AckResponse {
                branch,
                status: "initialized".to_string(),
            })
            .into_response()
        }
        Err(e) => engine_error(e),
    }
}

/// POST /branches/{id}/queue/reset
///
/// Zeroes every counter on the branch. Meant for start-of-day resets.
pub async fn reset_queue(
    State(state): State<Arc<AppState>>,
    Path(branch): Path<String>,
    AuthIdentity(identity): AuthIdentity,
) -> Response {
    if !identity.role.is_at_least(Role::Manager) {
        return forbidden(Role::Manager);
    }

    match state.engine().reset(&branch).await {
        Ok(()) => {
            info!(branch = %branch, user_id = %identity.user_id, "branch queue reset");
            Json(AckResponse {
                branch,
                status: "reset".to_string(),
            })
            .into_response()
        }
        Err(e) => engine_error(e),
    }
}

/// POST /admin/wipe
pub async fn wipe_all(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Response {
    if !identity.role.is_at_least(Role::Admin) {
        return forbidden(Role::Admin);
    }

    match state.engine().wipe_all().await {
        Ok(()) => {
            info!(user_id = %identity.user_id, "all branch queues wiped");
            Json(AckResponse {
                branch: "*".to_string(),
                status: "wiped".to_string(),
            })
            .into_response()
        }
        Err(e) => engine_error(e),
    }
}
