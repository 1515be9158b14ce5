//! Testing utilities and mock implementations.
//!
//! Mocks for the two external seams — the paging transport and the counter
//! store — so the engine, dispatcher and server can be tested without real
//! infrastructure.

mod flaky_store;
mod mock_pager;

pub use flaky_store::FlakyCounterStore;
pub use mock_pager::MockPager;
