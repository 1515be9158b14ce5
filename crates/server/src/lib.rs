//! waitline-server — HTTP and WebSocket surface over waitline-core.

pub mod api;
pub mod broadcast;
pub mod metrics;
pub mod session;
pub mod state;
