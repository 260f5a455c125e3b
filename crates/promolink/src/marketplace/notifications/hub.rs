use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use super::domain::Notification;
use crate::marketplace::accounts::UserId;

/// Fan-out of freshly committed notifications to live subscribers.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl NotificationHub {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers saw the notification. Zero is not an error.
    pub fn publish(&self, notification: Notification) -> usize {
        let id = notification.id.clone();
        match self.sender.send(notification) {
            Ok(receivers) => {
                debug!(notification_id = %id, receivers, "notification published");
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self, user_id: UserId) -> NotificationSubscription {
        NotificationSubscription {
            user_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Live feed for one user. Dropping it unsubscribes.
#[derive(Debug)]
pub struct NotificationSubscription {
    user_id: UserId,
    receiver: broadcast::Receiver<Notification>,
}

impl NotificationSubscription {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Next notification addressed to this user; `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) if notification.user_id == self.user_id => {
                    return Some(notification)
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "notification subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) if notification.user_id == self.user_id => {
                    return Some(notification)
                }
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "notification subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Notification> + Send + 'static {
        let user_id = self.user_id;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(notification) if notification.user_id == user_id => Some(notification),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(user_id = %user_id, skipped, "notification stream lagged");
                None
            }
        })
    }
}
