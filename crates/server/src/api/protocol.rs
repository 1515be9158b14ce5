//! WebSocket wire protocol.
//!
//! All frames are JSON objects tagged by `type`. Inbound frames on one
//! connection are handled sequentially, so a caller correlates each direct
//! reply with its request by order.

use serde::{Deserialize, Serialize};
use waitline_core::{format_ticket, BranchState, CallOutcome, FinishOutcome, IssuedTicket, SkipOutcome};

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ClientMessage {
    /// Customer requests a ticket; `phone` is the contact to page.
    RequestTicket {
        #[serde(default)]
        phone: Option<String>,
    },
    /// Agent calls the next waiting ticket.
    CallNext {
        #[serde(default)]
        finished_previous: bool,
    },
    /// Agent records a finished ticket without calling a new one.
    FinishTicket { ticket: i64 },
    /// Agent skips a ticket.
    SkipTicket { ticket: i64 },
}

/// Error codes carried on `error` reply frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Valid identity, insufficient role. No state was changed.
    Forbidden,
    /// Frame was not a valid client message.
    BadRequest,
    /// Counter store unreachable or timed out; the operation aborted.
    StoreUnavailable,
}

/// Frames the server sends: direct replies, broadcasts and the
/// connection seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current branch state, pushed to a connection right after it is
    /// accepted (and never broadcast).
    QueueState {
        branch: String,
        issued: i64,
        serving: String,
        waiting: i64,
        served: i64,
        skipped: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },

    // --- direct replies -------------------------------------------------
    /// Reply to `request_ticket`. `notified` is false when paging failed
    /// after its retry; the ticket is valid either way.
    TicketIssued {
        number: String,
        waiting: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<String>,
        notified: bool,
    },
    /// Reply to `call_next`. `empty` marks the nobody-was-waiting no-op.
    CallResult {
        empty: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        serving: Option<String>,
        waiting: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// Reply to `finish_ticket`.
    TicketFinished { served: i64, ticket: String },
    /// Reply to `skip_ticket`.
    TicketSkipped { skipped: i64, ticket: String },
    /// Reply to any request that failed.
    Error { code: ErrorCode, message: String },

    // --- branch broadcasts ----------------------------------------------
    /// A ticket was issued on this branch.
    NewTicket {
        number: String,
        waiting: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// A ticket is now being served on this branch.
    NewCall {
        serving: String,
        waiting: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// A ticket was recorded finished on this branch.
    FinishedTicket { served: i64, ticket: String },
    /// A ticket was skipped on this branch.
    SkippedTicket { skipped: i64, ticket: String },
}

impl ServerMessage {
    /// Stable frame-type name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::QueueState { .. } => "queue_state",
            ServerMessage::TicketIssued { .. } => "ticket_issued",
            ServerMessage::CallResult { .. } => "call_result",
            ServerMessage::TicketFinished { .. } => "ticket_finished",
            ServerMessage::TicketSkipped { .. } => "ticket_skipped",
            ServerMessage::Error { .. } => "error",
            ServerMessage::NewTicket { .. } => "new_ticket",
            ServerMessage::NewCall { .. } => "new_call",
            ServerMessage::FinishedTicket { .. } => "finished_ticket",
            ServerMessage::SkippedTicket { .. } => "skipped_ticket",
        }
    }

    pub fn queue_state(branch: &str, state: BranchState) -> Self {
        ServerMessage::QueueState {
            branch: branch.to_string(),
            issued: state.issued,
            serving: format_ticket(state.serving),
            waiting: state.waiting,
            served: state.served,
            skipped: state.skipped,
            next: state.next().map(format_ticket),
        }
    }

    pub fn ticket_issued(ticket: &IssuedTicket, notified: bool) -> Self {
        ServerMessage::TicketIssued {
            number: format_ticket(ticket.number),
            waiting: ticket.waiting,
            next: ticket.next.map(format_ticket),
            notified,
        }
    }

    pub fn new_ticket(ticket: &IssuedTicket) -> Self {
        ServerMessage::NewTicket {
            number: format_ticket(ticket.number),
            waiting: ticket.waiting,
            next: ticket.next.map(format_ticket),
        }
    }

    /// Reply for a call outcome; `new_call` broadcasts are built separately
    /// because an empty call must not broadcast at all.
    pub fn call_result(outcome: &CallOutcome) -> Self {
        match *outcome {
            CallOutcome::Served { serving, waiting, next } => ServerMessage::CallResult {
                empty: false,
                serving: Some(format_ticket(serving)),
                waiting,
                next: next.map(format_ticket),
            },
            CallOutcome::EmptyQueue => ServerMessage::CallResult {
                empty: true,
                serving: None,
                waiting: 0,
                next: None,
            },
        }
    }

    pub fn new_call(serving: i64, waiting: i64, next: Option<i64>) -> Self {
        ServerMessage::NewCall {
            serving: format_ticket(serving),
            waiting,
            next: next.map(format_ticket),
        }
    }

    pub fn ticket_finished(outcome: &FinishOutcome) -> Self {
        ServerMessage::TicketFinished {
            served: outcome.served,
            ticket: format_ticket(outcome.ticket),
        }
    }

    pub fn finished_ticket(outcome: &FinishOutcome) -> Self {
        ServerMessage::FinishedTicket {
            served: outcome.served,
            ticket: format_ticket(outcome.ticket),
        }
    }

    pub fn ticket_skipped(outcome: &SkipOutcome) -> Self {
        ServerMessage::TicketSkipped {
            skipped: outcome.skipped,
            ticket: format_ticket(outcome.ticket),
        }
    }

    pub fn skipped_ticket(outcome: &SkipOutcome) -> Self {
        ServerMessage::SkippedTicket {
            skipped: outcome.skipped,
            ticket: format_ticket(outcome.ticket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"request_ticket","phone":"5551234"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::RequestTicket {
                phone: Some("5551234".to_string())
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"call_next"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CallNext {
                finished_previous: false
            }
        );

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"finish_ticket","ticket":12}"#).unwrap();
        assert_eq!(msg, ClientMessage::FinishTicket { ticket: 12 });
    }

    #[test]
    fn unknown_frame_type_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"drop_tables"}"#).is_err());
    }

    #[test]
    fn ticket_numbers_serialize_zero_padded() {
        let ticket = IssuedTicket {
            number: 7,
            waiting: 1,
            next: Some(7),
        };
        let json = serde_json::to_value(ServerMessage::new_ticket(&ticket)).unwrap();
        assert_eq!(json["type"], "new_ticket");
        assert_eq!(json["number"], "007");
        assert_eq!(json["next"], "007");
    }

    #[test]
    fn absent_next_is_omitted() {
        let json = serde_json::to_value(ServerMessage::call_result(&CallOutcome::Served {
            serving: 2,
            waiting: 0,
            next: None,
        }))
        .unwrap();
        assert!(json.get("next").is_none());
        assert_eq!(json["serving"], "002");
        assert_eq!(json["empty"], false);
    }

    #[test]
    fn empty_call_result_shape() {
        let json =
            serde_json::to_value(ServerMessage::call_result(&CallOutcome::EmptyQueue)).unwrap();
        assert_eq!(json["empty"], true);
        assert!(json.get("serving").is_none());
    }

    #[test]
    fn queue_state_includes_computed_next() {
        let state = BranchState {
            issued: 5,
            serving: 3,
            waiting: 2,
            served: 2,
            skipped: 1,
        };
        let json = serde_json::to_value(ServerMessage::queue_state("b1", state)).unwrap();
        assert_eq!(json["serving"], "003");
        assert_eq!(json["next"], "004");
    }
}
