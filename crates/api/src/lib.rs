//! HTTP API layer for evote-rs.
//!
//! - **Endpoints**: events, contestants, free votes, payments
//! - **Extractors**: organizer authentication, voter address
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8. Routes are relative; the server mounts them under `/api`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
