//! Ticket queue engine.
//!
//! Per-branch state machine over the counter store: issue tickets, call
//! the next ticket, record finishes and skips, and answer state queries.
//! A ticket is not a stored entity — it is the value of the `issued`
//! counter at the moment of issuance, never deleted or reassigned.

mod engine;
mod types;

pub use engine::{EngineError, QueueEngine};
pub use types::{format_ticket, BranchState, CallOutcome, FinishOutcome, IssuedTicket, SkipOutcome, TICKET_DISPLAY_WIDTH};
