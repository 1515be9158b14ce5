//! WebSocket endpoint: the real-time session surface.
//!
//! The token is verified *before* the upgrade; a connection that fails
//! verification is rejected with 401 and never reaches a socket loop.
//! Accepted connections become a [`Session`] bound to the branch named in
//! the verified token, receive the current queue state as a seed frame,
//! and then exchange protocol frames until disconnect.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::broadcast::BranchEvent;
use crate::metrics::{
    AUTH_FAILURES_TOTAL, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS,
    WS_MESSAGES_SENT,
};
use crate::session::Session;
use crate::state::AppState;

use super::protocol::{ClientMessage, ErrorCode, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Identity token; equivalent to the Authorization header for clients
    /// that cannot set headers on a WebSocket handshake.
    pub token: Option<String>,
}

fn extract_token(headers: &HeaderMap, query: &WsQuery) -> Option<String> {
    if let Some(value) = headers.get("authorization") {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
            {
                return Some(token.to_string());
            }
        }
    }
    query.token.clone()
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(token) = extract_token(&headers, &query) else {
        AUTH_FAILURES_TOTAL.with_label_values(&["ws"]).inc();
        return (StatusCode::UNAUTHORIZED, "missing identity token").into_response();
    };

    let identity = match state.verifier().verify(&token) {
        Ok(identity) => identity,
        Err(e) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["ws"]).inc();
            warn!(error = %e, "rejected websocket connection");
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, Session::new(identity)))
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), ()> {
    let json = serde_json::to_string(message).map_err(|_| ())?;
    WS_MESSAGES_SENT.with_label_values(&[message.kind()]).inc();
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}

/// Handle a single accepted connection for its whole lifetime.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let (mut sender, mut receiver) = socket.split();

    // Group membership is fixed for the session lifetime and derived from
    // the verified token only.
    let mut group_rx = state.broadcaster().subscribe(session.branch());

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!(
        session = session.id,
        user_id = %session.identity.user_id,
        branch = %session.branch(),
        "websocket client connected"
    );

    // Seed the new connection (and only it) with current branch state.
    let seed = match state.engine().branch_state(session.branch()).await {
        Ok(branch_state) => ServerMessage::queue_state(session.branch(), branch_state),
        Err(e) => ServerMessage::Error {
            code: ErrorCode::StoreUnavailable,
            message: e.to_string(),
        },
    };
    if send_frame(&mut sender, &seed).await.is_err() {
        WS_CONNECTIONS_ACTIVE.dec();
        return;
    }

    loop {
        tokio::select! {
            // Forward branch events, skipping our own.
            event = group_rx.recv() => {
                match event {
                    Ok(BranchEvent { origin, message }) if origin != session.id => {
                        if send_frame(&mut sender, &message).await.is_err() {
                            debug!(session = session.id, "send failed, client disconnected");
                            break;
                        }
                    }
                    Ok(_) => {} // our own event; the direct reply covered it
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(session = session.id, skipped = n, "client lagged behind branch events");
                        WS_LAG_EVENTS.inc();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("branch channel closed");
                        break;
                    }
                }
            }

            // Inbound frames, handled sequentially.
            frame = receiver.next() => {
                let Some(frame) = frame else { break };
                match frame {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => {
                                let handled = session.handle(&state, msg).await;
                                if let Some(broadcast_msg) = handled.broadcast {
                                    state.broadcaster().broadcast(
                                        session.branch(),
                                        session.id,
                                        broadcast_msg,
                                    );
                                }
                                handled.reply
                            }
                            Err(e) => ServerMessage::Error {
                                code: ErrorCode::BadRequest,
                                message: format!("unrecognized frame: {e}"),
                            },
                        };
                        if send_frame(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!(session = session.id, "client requested close");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        // Pong is handled automatically by axum
                        debug!(session = session.id, "received ping: {:?}", data);
                    }
                    Ok(_) => {
                        // Ignore binary and pong frames.
                    }
                    Err(e) => {
                        warn!(session = session.id, error = %e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    WS_CONNECTIONS_ACTIVE.dec();
    info!(session = session.id, "websocket client disconnected");
}
