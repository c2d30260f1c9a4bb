//! Business logic services.

#![allow(missing_docs)]

pub mod follow_workflow;
pub mod notification;
pub mod user_directory;

pub use follow_workflow::{
    AcceptOutcome, FollowBackOutcome, FollowWorkflowService, OperationResult, Relationship,
    RemoveOutcome, RemoveScope,
};
pub use notification::{FeedEntry, FeedQuery, NotificationService};
pub use user_directory::{DbUserDirectory, UserDirectory, UserSummary};
