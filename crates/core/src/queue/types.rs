//! Result shapes of queue engine operations.

use serde::{Deserialize, Serialize};

use crate::store::BranchCounters;

/// Minimum display width of a ticket number.
///
/// Padding is a minimum, not a cap: ticket 1000 renders as "1000". The
/// underlying counters are plain integers and never wrap.
pub const TICKET_DISPLAY_WIDTH: usize = 3;

/// Render a ticket number for display, zero-padded to the fixed width.
pub fn format_ticket(number: i64) -> String {
    format!("{:0width$}", number, width = TICKET_DISPLAY_WIDTH)
}

/// Result of issuing a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedTicket {
    /// The newly assigned ticket number.
    pub number: i64,
    /// Waiting count observed when this ticket joined the line.
    pub waiting: i64,
    /// Set to the new ticket number when it is immediately first in line.
    pub next: Option<i64>,
}

/// Result of calling the next ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// A ticket was actually called.
    Served {
        /// The ticket number now being served.
        serving: i64,
        /// Waiting count after this call.
        waiting: i64,
        /// The ticket that will be called next, when someone is still waiting.
        next: Option<i64>,
    },
    /// Nobody was waiting; serving position unchanged.
    EmptyQueue,
}

/// Result of recording a finished ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishOutcome {
    /// Total tickets marked finished on this branch.
    pub served: i64,
    /// The caller-supplied ticket number, echoed back unverified.
    pub ticket: i64,
}

/// Result of recording a skipped ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipOutcome {
    /// Total tickets marked skipped on this branch.
    pub skipped: i64,
    /// The caller-supplied ticket number, echoed back unverified.
    pub ticket: i64,
}

/// Full branch queue state, as returned by the query operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchState {
    pub issued: i64,
    pub serving: i64,
    pub waiting: i64,
    pub served: i64,
    pub skipped: i64,
}

impl BranchState {
    /// The ticket expected to be called next, when someone is waiting.
    pub fn next(&self) -> Option<i64> {
        (self.waiting > 0).then_some(self.serving + 1)
    }
}

impl From<BranchCounters> for BranchState {
    fn from(counters: BranchCounters) -> Self {
        Self {
            issued: counters.issued,
            serving: counters.serving,
            waiting: counters.waiting,
            served: counters.served,
            skipped: counters.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pads_to_three_digits() {
        assert_eq!(format_ticket(1), "001");
        assert_eq!(format_ticket(42), "042");
        assert_eq!(format_ticket(999), "999");
    }

    #[test]
    fn format_widens_past_the_display_width() {
        assert_eq!(format_ticket(1000), "1000");
        assert_eq!(format_ticket(123456), "123456");
    }

    #[test]
    fn next_requires_someone_waiting() {
        let mut state = BranchState {
            issued: 5,
            serving: 3,
            waiting: 2,
            served: 2,
            skipped: 1,
        };
        assert_eq!(state.next(), Some(4));

        state.waiting = 0;
        assert_eq!(state.next(), None);
    }
}
