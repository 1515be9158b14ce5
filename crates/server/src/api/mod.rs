pub mod branches;
pub mod handlers;
pub mod middleware;
pub mod protocol;
pub mod routes;
pub mod ws;

pub use routes::create_router;
