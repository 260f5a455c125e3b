use std::sync::Arc;

use tracing::info;

use super::domain::{Notification, NotificationId};
use crate::marketplace::accounts::{UserId, UserRole};
use crate::marketplace::clock::Clock;
use crate::marketplace::error::MarketplaceError;
use crate::marketplace::store::MarketplaceStore;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// One page of a user's inbox.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub notifications: Vec<Notification>,
    /// Set when the page came back full; there may be more rows beyond it.
    pub has_more: bool,
}

/// Inbox reads and read-flag updates for the acting user.
pub struct NotificationFeed<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    page_size: usize,
}

impl<S> NotificationFeed<S>
where
    S: MarketplaceStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn list(
        &self,
        user_id: &UserId,
        user_type: UserRole,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<FeedPage, MarketplaceError> {
        let limit = limit.unwrap_or(self.page_size).max(1);
        let notifications = self.store.notifications(user_id, user_type, offset, limit)?;
        let has_more = notifications.len() == limit;
        Ok(FeedPage {
            notifications,
            has_more,
        })
    }

    pub fn count_unread(
        &self,
        user_id: &UserId,
        user_type: UserRole,
    ) -> Result<usize, MarketplaceError> {
        Ok(self.store.count_unread(user_id, user_type)?)
    }

    /// Flip one notification to read. Repeating the call is a no-op.
    pub fn mark_read(
        &self,
        id: &NotificationId,
        acting_user: &UserId,
    ) -> Result<Notification, MarketplaceError> {
        let notification = self
            .store
            .fetch_notification(id)?
            .ok_or(MarketplaceError::NotFound("notification"))?;
        if &notification.user_id != acting_user {
            return Err(MarketplaceError::forbidden(
                "you can only update your own notifications",
            ));
        }
        if notification.read {
            return Ok(notification);
        }

        let at = self.clock.now();
        self.store.mark_notification_read(id, at)?;
        info!(notification_id = %id, user_id = %acting_user, "notification marked read");
        Ok(Notification {
            read: true,
            updated_at: at,
            ..notification
        })
    }

    pub fn mark_all_read(
        &self,
        user_id: &UserId,
        user_type: UserRole,
    ) -> Result<usize, MarketplaceError> {
        let changed = self
            .store
            .mark_all_notifications_read(user_id, user_type, self.clock.now())?;
        if changed > 0 {
            info!(user_id = %user_id, changed, "notifications marked read");
        }
        Ok(changed)
    }
}
