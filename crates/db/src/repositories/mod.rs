//! Repositories.
//!
//! Each repository borrows a connection (`DatabaseConnection` or
//! `DatabaseTransaction`) and is cheap to construct per call.

mod follow_request;
mod friendship;
mod notification;
mod user;

pub use follow_request::FollowRequestRepository;
pub use friendship::FriendshipRepository;
pub use notification::{NotificationQuery, NotificationRepository};
pub use user::UserRepository;
