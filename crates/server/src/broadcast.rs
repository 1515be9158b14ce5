//! Per-branch broadcast groups.
//!
//! One `tokio::broadcast` channel per branch, created lazily on first
//! subscribe or send. Sends are fire-and-forget: a slow subscriber lags
//! and skips messages, it never blocks the operation that triggered the
//! broadcast. Group names come from verified identity only, never from
//! client-supplied input.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::api::protocol::ServerMessage;

/// Capacity of each branch channel; a subscriber further behind than this
/// starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// A broadcast frame tagged with the session that caused it.
///
/// The originator's forward loop drops its own frames; the caller learns
/// the outcome from its direct reply instead.
#[derive(Debug, Clone)]
pub struct BranchEvent {
    pub origin: u64,
    pub message: ServerMessage,
}

/// Branch-keyed broadcast groups.
#[derive(Debug, Default)]
pub struct BranchBroadcaster {
    channels: Mutex<HashMap<String, broadcast::Sender<BranchEvent>>>,
}

impl BranchBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, branch: &str) -> broadcast::Sender<BranchEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(branch.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Join the broadcast group of one branch.
    pub fn subscribe(&self, branch: &str) -> broadcast::Receiver<BranchEvent> {
        self.sender(branch).subscribe()
    }

    /// Send a frame to every current member of a branch group. Returns the
    /// number of subscribers the frame was handed to (0 when nobody is
    /// connected — not an error).
    pub fn broadcast(&self, branch: &str, origin: u64, message: ServerMessage) -> usize {
        self.sender(branch)
            .send(BranchEvent { origin, message })
            .unwrap_or(0)
    }
}
