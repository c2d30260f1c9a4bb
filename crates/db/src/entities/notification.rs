//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "follow_request")]
    FollowRequest,
    #[sea_orm(string_value = "friend_accepted")]
    FriendAccepted,
    #[sea_orm(string_value = "follow_back")]
    FollowBack,
    #[sea_orm(string_value = "followed_you_back")]
    FollowedYouBack,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "mention")]
    Mention,
}

impl NotificationType {
    /// Wire name, identical to the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FollowRequest => "follow_request",
            Self::FriendAccepted => "friend_accepted",
            Self::FollowBack => "follow_back",
            Self::FollowedYouBack => "followed_you_back",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Mention => "mention",
        }
    }

    /// Whether at most one live event of this type may exist per (recipient, sender).
    #[must_use]
    pub const fn is_unique_while_live(self) -> bool {
        matches!(self, Self::FollowRequest | Self::FollowBack)
    }

    /// Whether this event refers to a post.
    #[must_use]
    pub const fn is_post_event(self) -> bool {
        matches!(self, Self::Like | Self::Comment | Self::Mention)
    }

    /// Deduplication key for types that are unique while live.
    #[must_use]
    pub fn dedupe_key(self, recipient_id: &str, sender_id: &str) -> Option<String> {
        self.is_unique_while_live()
            .then(|| format!("{}:{recipient_id}:{sender_id}", self.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    pub recipient_id: String,

    /// The user who triggered the notification
    pub sender_id: String,

    /// Notification type
    pub notification_type: NotificationType,

    /// Related post (like, comment, mention)
    #[sea_orm(nullable)]
    pub post_id: Option<String>,

    /// Set for types that must stay unique while live; NULL otherwise
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub dedupe_key: Option<String>,

    #[sea_orm(default_value = false)]
    pub seen: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
