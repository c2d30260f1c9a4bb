//! Notifications endpoints.

use axum::{Json, Router, extract::State, routing::post};
use followgraph_common::AppResult;
use followgraph_core::{FeedEntry, FeedQuery, UserSummary};
use followgraph_db::entities::notification::NotificationType;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    /// Maximum results (default and cap come from `feed` config)
    pub limit: Option<u64>,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
    #[serde(default)]
    pub unseen_only: bool,
    /// Include only these notification types
    #[serde(default)]
    pub include_types: Vec<NotificationType>,
}

/// Request naming one notification.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIdRequest {
    #[validate(length(min = 1, max = 64))]
    pub notification_id: String,
}

/// Notification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub created_at: String,
    pub seen: bool,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub sender: Option<UserSummary>,
}

impl From<FeedEntry> for NotificationResponse {
    fn from(entry: FeedEntry) -> Self {
        let n = entry.notification;
        Self {
            id: n.id,
            created_at: n.created_at.to_rfc3339(),
            seen: n.seen,
            notification_type: n.notification_type,
            sender_id: n.sender_id,
            post_id: n.post_id,
            sender: entry.sender,
        }
    }
}

/// Count response.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// List the caller's notifications.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let query = FeedQuery {
        types: req.include_types,
        unseen_only: req.unseen_only,
        until_id: req.until_id,
        limit: state.feed.clamp(req.limit),
    };

    let feed = state.notification_service.feed(&user.id, &query).await?;
    Ok(ApiResponse::ok(feed.into_iter().map(Into::into).collect()))
}

/// Mark one notification as seen.
async fn mark_seen(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NotificationIdRequest>,
) -> AppResult<ApiResponse<bool>> {
    req.validate()?;
    let updated = state
        .notification_service
        .mark_seen(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// Mark every notification as seen.
async fn mark_all_seen(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.mark_all_seen(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Number of unseen notifications.
async fn unseen_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.count_unseen(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Delete one notification.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NotificationIdRequest>,
) -> AppResult<ApiResponse<bool>> {
    req.validate()?;
    let deleted = state
        .notification_service
        .delete(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(deleted))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(list))
        .route("/notifications/mark-seen", post(mark_seen))
        .route("/notifications/mark-all-seen", post(mark_all_seen))
        .route("/notifications/unseen-count", post(unseen_count))
        .route("/notifications/delete", post(delete))
}
