//! HTTP API layer for followgraph.
//!
//! - **Endpoints**: follow workflow, graph reads and the notification feed
//! - **Extractors**: the authenticated caller
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
