//! Core business logic for followgraph.
//!
//! [`FollowWorkflowService`] coordinates follow requests, friendship edges and
//! notification events; [`NotificationService`] assembles the read side.

pub mod services;

pub use services::*;
