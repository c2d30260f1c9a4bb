//! API endpoints.

mod following;
mod notifications;

use axum::{Router, routing::get};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/following", following::router())
        .merge(notifications::router())
}

async fn healthz() -> &'static str {
    "ok"
}
