//! Following endpoints.

use axum::{Json, Router, extract::State, routing::post};
use followgraph_common::AppResult;
use followgraph_core::{OperationResult, Relationship};
use followgraph_db::entities::{follow_request, friendship};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Request naming the other user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
}

/// Remove request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    /// `requested`, `following`, or absent for both.
    pub scope: Option<String>,
}

/// Paginated listing request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    /// Whose list; defaults to the caller.
    #[validate(length(min = 1, max = 64))]
    pub user_id: Option<String>,
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}

/// Pending follow request response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequestResponse {
    pub id: String,
    pub requester_id: String,
    pub target_id: String,
    pub created_at: String,
}

impl From<follow_request::Model> for FollowRequestResponse {
    fn from(r: follow_request::Model) -> Self {
        Self {
            id: r.id,
            requester_id: r.requester_id,
            target_id: r.target_id,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Friendship edge response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipResponse {
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    pub created_at: String,
}

impl From<friendship::Model> for FriendshipResponse {
    fn from(f: friendship::Model) -> Self {
        Self {
            id: f.id,
            user_id: f.user_id,
            friend_id: f.friend_id,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

/// Send a follow request.
async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<OperationResult>> {
    req.validate()?;
    Ok(ApiResponse::ok(
        state
            .following_service
            .send_follow_request(&user.id, &req.user_id)
            .await,
    ))
}

/// Accept a follow request sent to the caller.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<bool>> {
    req.validate()?;
    Ok(ApiResponse::ok(
        state
            .following_service
            .accept_follow_request(&user.id, &req.user_id)
            .await,
    ))
}

/// Reject a follow request sent to the caller.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<bool>> {
    req.validate()?;
    Ok(ApiResponse::ok(
        state
            .following_service
            .reject_follow_request(&user.id, &req.user_id)
            .await,
    ))
}

/// Follow one of the caller's followers back.
async fn follow_back(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<OperationResult>> {
    req.validate()?;
    Ok(ApiResponse::ok(
        state
            .following_service
            .follow_back_user(&user.id, &req.user_id)
            .await,
    ))
}

/// Cancel a request and/or unfollow.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveRequest>,
) -> AppResult<ApiResponse<OperationResult>> {
    req.validate()?;
    Ok(ApiResponse::ok(
        state
            .following_service
            .remove_follow_request(&user.id, &req.user_id, req.scope.as_deref())
            .await,
    ))
}

/// Drop a follower.
async fn remove_follower(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<bool>> {
    req.validate()?;
    let removed = state
        .following_service
        .remove_follower(&user.id, &req.user_id)
        .await?;
    Ok(ApiResponse::ok(removed))
}

/// Relationship between the caller and another user.
async fn relation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<Relationship>> {
    req.validate()?;
    let relationship = state
        .following_service
        .relationship(&user.id, &req.user_id)
        .await?;
    Ok(ApiResponse::ok(relationship))
}

/// Pending requests received by the caller.
async fn received(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<FollowRequestResponse>>> {
    req.validate()?;
    let requests = state
        .following_service
        .pending_received(&user.id, state.feed.clamp(req.limit), req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(requests.into_iter().map(Into::into).collect()))
}

/// Pending requests sent by the caller.
async fn sent(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<FollowRequestResponse>>> {
    req.validate()?;
    let requests = state
        .following_service
        .pending_sent(&user.id, state.feed.clamp(req.limit), req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(requests.into_iter().map(Into::into).collect()))
}

/// Followers of a user.
async fn followers(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<FriendshipResponse>>> {
    req.validate()?;
    let user_id = req.user_id.as_deref().unwrap_or(&user.id);
    let edges = state
        .following_service
        .followers(user_id, state.feed.clamp(req.limit), req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(edges.into_iter().map(Into::into).collect()))
}

/// Users a user follows.
async fn following(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<FriendshipResponse>>> {
    req.validate()?;
    let user_id = req.user_id.as_deref().unwrap_or(&user.id);
    let edges = state
        .following_service
        .following(user_id, state.feed.clamp(req.limit), req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(edges.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests/send", post(send))
        .route("/requests/accept", post(accept))
        .route("/requests/reject", post(reject))
        .route("/requests/received", post(received))
        .route("/requests/sent", post(sent))
        .route("/follow-back", post(follow_back))
        .route("/remove", post(remove))
        .route("/remove-follower", post(remove_follower))
        .route("/relation", post(relation))
        .route("/followers", post(followers))
        .route("/following", post(following))
}
