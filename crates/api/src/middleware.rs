//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use followgraph_common::config::FeedConfig;
use followgraph_core::{
    DbUserDirectory, FollowWorkflowService, NotificationService, UserDirectory,
};
use followgraph_db::SocialStore;
use tracing::warn;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub store: SocialStore,
    pub following_service: FollowWorkflowService,
    pub notification_service: NotificationService,
    pub feed: FeedConfig,
}

impl AppState {
    /// Wire the services over one store.
    #[must_use]
    pub fn new(store: SocialStore, feed: FeedConfig) -> Self {
        let directory: Arc<dyn UserDirectory> = Arc::new(DbUserDirectory::new(store.clone()));

        Self {
            following_service: FollowWorkflowService::new(store.clone(), Arc::clone(&directory)),
            notification_service: NotificationService::new(store.clone(), directory),
            store,
            feed,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions for [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.store.users().find_by_token(token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to resolve bearer token"),
        }
    }

    next.run(req).await
}
