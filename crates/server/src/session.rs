//! One authenticated live connection.
//!
//! A session owns its verified identity and its membership in exactly one
//! branch broadcast group for its entire lifetime. Sessions never own
//! queue state; they invoke engine operations against the shared branch
//! record and translate outcomes into reply and broadcast frames.

use std::sync::atomic::{AtomicU64, Ordering};

use waitline_core::{CallOutcome, EngineError, Identity, Role};

use crate::api::protocol::{ClientMessage, ErrorCode, ServerMessage};
use crate::metrics::{
    CALLS_EMPTY_TOTAL, CALLS_SERVED_TOTAL, PAGE_FAILURES_TOTAL, TICKETS_FINISHED_TOTAL,
    TICKETS_ISSUED_TOTAL, TICKETS_SKIPPED_TOTAL,
};
use crate::state::AppState;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// What a handled client message produces: always a direct reply, and a
/// broadcast to the branch group when state actually changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub reply: ServerMessage,
    pub broadcast: Option<ServerMessage>,
}

impl Handled {
    fn reply_only(reply: ServerMessage) -> Self {
        Self {
            reply,
            broadcast: None,
        }
    }
}

/// An authenticated connection bound to one branch.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: u64,
    pub identity: Identity,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            identity,
        }
    }

    pub fn branch(&self) -> &str {
        &self.identity.branch_id
    }

    /// Handle one inbound message: authorize, run the engine operation,
    /// shape the reply and the branch broadcast.
    ///
    /// Role scoping happens here, before the engine is reached; the engine
    /// itself is role-agnostic.
    pub async fn handle(&self, state: &AppState, msg: ClientMessage) -> Handled {
        match msg {
            ClientMessage::RequestTicket { phone } => self.request_ticket(state, phone).await,
            ClientMessage::CallNext { finished_previous } => {
                if let Some(denied) = self.require_agent("call_next") {
                    return denied;
                }
                self.call_next(state, finished_previous).await
            }
            ClientMessage::FinishTicket { ticket } => {
                if let Some(denied) = self.require_agent("finish_ticket") {
                    return denied;
                }
                self.finish_ticket(state, ticket).await
            }
            ClientMessage::SkipTicket { ticket } => {
                if let Some(denied) = self.require_agent("skip_ticket") {
                    return denied;
                }
                self.skip_ticket(state, ticket).await
            }
        }
    }

    fn require_agent(&self, operation: &str) -> Option<Handled> {
        if self.identity.role.is_at_least(Role::Agent) {
            return None;
        }
        tracing::warn!(
            user_id = %self.identity.user_id,
            branch = %self.identity.branch_id,
            operation,
            "operation denied"
        );
        Some(Handled::reply_only(ServerMessage::Error {
            code: ErrorCode::Forbidden,
            message: format!("{operation} requires at least the agent role"),
        }))
    }

    async fn request_ticket(&self, state: &AppState, phone: Option<String>) -> Handled {
        let ticket = match state.engine().issue(self.branch()).await {
            Ok(ticket) => ticket,
            Err(e) => return Handled::reply_only(engine_error(e)),
        };
        TICKETS_ISSUED_TOTAL.inc();

        // The ticket is committed; a failed page never reverses it.
        let notified = match phone {
            Some(ref phone) => match state.dispatcher().page_ticket(phone, ticket.number).await {
                Ok(()) => true,
                Err(e) => {
                    PAGE_FAILURES_TOTAL.inc();
                    tracing::warn!(
                        branch = %self.branch(),
                        number = ticket.number,
                        error = %e,
                        "customer page failed, ticket stands"
                    );
                    false
                }
            },
            None => true,
        };

        Handled {
            reply: ServerMessage::ticket_issued(&ticket, notified),
            broadcast: Some(ServerMessage::new_ticket(&ticket)),
        }
    }

    async fn call_next(&self, state: &AppState, finished_previous: bool) -> Handled {
        let outcome = match state.engine().call_next(self.branch(), finished_previous).await {
            Ok(outcome) => outcome,
            Err(e) => return Handled::reply_only(engine_error(e)),
        };

        // An empty call changed nothing visible; the branch hears nothing.
        let broadcast = match outcome {
            CallOutcome::Served { serving, waiting, next } => {
                CALLS_SERVED_TOTAL.inc();
                Some(ServerMessage::new_call(serving, waiting, next))
            }
            CallOutcome::EmptyQueue => {
                CALLS_EMPTY_TOTAL.inc();
                None
            }
        };

        Handled {
            reply: ServerMessage::call_result(&outcome),
            broadcast,
        }
    }

    async fn finish_ticket(&self, state: &AppState, ticket: i64) -> Handled {
        match state.engine().finish(self.branch(), ticket).await {
            Ok(outcome) => {
                TICKETS_FINISHED_TOTAL.inc();
                Handled {
                    reply: ServerMessage::ticket_finished(&outcome),
                    broadcast: Some(ServerMessage::finished_ticket(&outcome)),
                }
            }
            Err(e) => Handled::reply_only(engine_error(e)),
        }
    }

    async fn skip_ticket(&self, state: &AppState, ticket: i64) -> Handled {
        match state.engine().skip(self.branch(), ticket).await {
            Ok(outcome) => {
                TICKETS_SKIPPED_TOTAL.inc();
                Handled {
                    reply: ServerMessage::ticket_skipped(&outcome),
                    broadcast: Some(ServerMessage::skipped_ticket(&outcome)),
                }
            }
            Err(e) => Handled::reply_only(engine_error(e)),
        }
    }
}

fn engine_error(e: EngineError) -> ServerMessage {
    ServerMessage::Error {
        code: ErrorCode::StoreUnavailable,
        message: e.to_string(),
    }
}
