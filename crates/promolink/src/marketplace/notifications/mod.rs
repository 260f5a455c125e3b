pub mod domain;
pub mod feed;
pub mod hub;

pub use domain::{Notification, NotificationEvent, NotificationId, NotificationKind};
pub use feed::{FeedPage, NotificationFeed, DEFAULT_PAGE_SIZE};
pub use hub::{NotificationHub, NotificationSubscription};
