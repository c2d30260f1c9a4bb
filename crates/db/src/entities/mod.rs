//! Database entities.

pub mod follow_request;
pub mod friendship;
pub mod notification;
pub mod user;

pub use follow_request::Entity as FollowRequest;
pub use friendship::Entity as Friendship;
pub use notification::Entity as Notification;
pub use user::Entity as User;
