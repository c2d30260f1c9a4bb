//! Follow request entity and its status transitions.
//!
//! A request row lives only while it is pending: resolving it stamps the terminal
//! status and deletes the row inside the same transaction. The typestate below
//! makes the transition one-way; a [`ResolvedFollowRequest`] can only carry
//! `Accepted` or `Rejected`, so nothing can move a request back to `Pending`.

use followgraph_common::AppError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Follow request status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum FollowRequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user asking to follow
    pub requester_id: String,

    /// The user being asked
    pub target_id: String,

    /// Unordered pair key, unique across both directions
    #[sea_orm(unique)]
    pub pair_key: String,

    pub status: FollowRequestStatus,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RequesterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Requester,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TargetId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}

/// Returned when a loaded request is no longer pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("follow request is not pending (status: {0:?})")]
pub struct NotPending(pub FollowRequestStatus);

impl From<NotPending> for AppError {
    fn from(err: NotPending) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A follow request that is known to be pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFollowRequest(Model);

impl TryFrom<Model> for PendingFollowRequest {
    type Error = NotPending;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        match model.status {
            FollowRequestStatus::Pending => Ok(Self(model)),
            other => Err(NotPending(other)),
        }
    }
}

impl PendingFollowRequest {
    /// Request id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// The user asking to follow.
    #[must_use]
    pub fn requester_id(&self) -> &str {
        &self.0.requester_id
    }

    /// The user being asked.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.0.target_id
    }

    /// Borrow the stored row.
    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.0
    }

    /// Pending -> Accepted.
    #[must_use]
    pub fn accept(self) -> ResolvedFollowRequest {
        ResolvedFollowRequest {
            request: self.0,
            resolution: Resolution::Accepted,
        }
    }

    /// Pending -> Rejected.
    #[must_use]
    pub fn reject(self) -> ResolvedFollowRequest {
        ResolvedFollowRequest {
            request: self.0,
            resolution: Resolution::Rejected,
        }
    }
}

/// Terminal outcome of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Accepted,
    Rejected,
}

impl Resolution {
    /// Stored status for this outcome.
    #[must_use]
    pub const fn status(self) -> FollowRequestStatus {
        match self {
            Self::Accepted => FollowRequestStatus::Accepted,
            Self::Rejected => FollowRequestStatus::Rejected,
        }
    }
}

/// A follow request that has left the pending state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFollowRequest {
    request: Model,
    resolution: Resolution,
}

impl ResolvedFollowRequest {
    /// Request id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.request.id
    }

    /// The user who asked to follow.
    #[must_use]
    pub fn requester_id(&self) -> &str {
        &self.request.requester_id
    }

    /// The user who was asked.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.request.target_id
    }

    /// How the request ended.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }
}
