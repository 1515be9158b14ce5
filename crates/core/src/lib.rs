//! waitline-core — domain logic for the branch queueing service.
//!
//! The pieces, leaves first: the counter [`store`], the ticket queue
//! engine in [`queue`], token verification in [`auth`], and customer
//! paging in [`notify`]. The network surface (WebSocket sessions, REST
//! admin endpoints) lives in the server crate.

pub mod auth;
pub mod config;
pub mod notify;
pub mod queue;
pub mod store;
pub mod testing;

pub use auth::{
    create_verifier, sign_identity, AuthError, Claims, Identity, JwtVerifier, NoneVerifier, Role,
    TokenVerifier,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, EngineConfig, PagerBackend, PagerConfig, SanitizedConfig, ServerConfig,
    StoreBackend, StoreConfig,
};
pub use notify::{
    create_pager, HttpPager, NonePager, NotificationDispatcher, NotifyError, Pager, PagerError,
};
pub use queue::{
    format_ticket, BranchState, CallOutcome, EngineError, FinishOutcome, IssuedTicket,
    QueueEngine, SkipOutcome, TICKET_DISPLAY_WIDTH,
};
pub use store::{
    create_store, BranchCounters, CounterStore, Field, MemoryCounterStore, SqliteCounterStore,
    StoreError,
};
