//! Data access layer. Each query is a fixed filter over one table; multi-row writes go through
//! [`WriteBatch`] so a state change and its notification land together or not at all.

mod memory;

pub use memory::InMemoryMarketplaceStore;

use chrono::{DateTime, NaiveDate, Utc};

use super::accounts::{Account, UserId, UserRole};
use super::notifications::domain::{Notification, NotificationId};
use super::offers::domain::{Offer, OfferId};
use super::requests::domain::{Request, RequestId, RequestStatus};

/// Storage abstraction so services can be exercised without a database.
pub trait MarketplaceStore: Send + Sync {
    fn account(&self, id: &UserId) -> Result<Option<Account>, RepositoryError>;
    fn upsert_account(&self, account: Account) -> Result<(), RepositoryError>;

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError>;
    fn update_offer(&self, offer: Offer) -> Result<(), RepositoryError>;
    fn fetch_offer(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError>;
    /// ACTIVE, not soft-deleted, `end_date >= today`; newest first.
    fn active_offers(&self, today: NaiveDate) -> Result<Vec<Offer>, RepositoryError>;
    /// Offers owned by `supplier_id`, newest first.
    fn supplier_offers(
        &self,
        supplier_id: &UserId,
        include_deleted: bool,
    ) -> Result<Vec<Offer>, RepositoryError>;
    /// Flip ACTIVE offers that ended before `today` to EXPIRED; returns the affected ids.
    fn expire_offers(
        &self,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Vec<OfferId>, RepositoryError>;

    fn fetch_request(&self, id: &RequestId) -> Result<Option<Request>, RepositoryError>;
    fn store_requests(&self, store_id: &UserId) -> Result<Vec<Request>, RepositoryError>;
    fn supplier_requests(&self, supplier_id: &UserId) -> Result<Vec<Request>, RepositoryError>;

    fn fetch_notification(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;
    /// Newest first, skipping `offset` rows and returning at most `limit`.
    fn notifications(
        &self,
        user_id: &UserId,
        user_type: UserRole,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError>;
    fn count_unread(&self, user_id: &UserId, user_type: UserRole)
        -> Result<usize, RepositoryError>;
    /// Returns whether the flag changed; an already-read row is left untouched.
    fn mark_notification_read(
        &self,
        id: &NotificationId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
    fn mark_all_notifications_read(
        &self,
        user_id: &UserId,
        user_type: UserRole,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;

    /// Apply every write in `batch` atomically. When any precondition fails nothing is written.
    fn commit(&self, batch: WriteBatch) -> Result<(), RepositoryError>;
}

/// Ordered set of writes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Precondition only: the offer must still be available to stores on `today`.
    RequireAvailableOffer {
        offer_id: OfferId,
        today: NaiveDate,
    },
    InsertRequest(Request),
    /// Compare-and-set on the request status.
    TransitionRequest {
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
    },
    InsertNotification(Notification),
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_available_offer(mut self, offer_id: OfferId, today: NaiveDate) -> Self {
        self.writes.push(Write::RequireAvailableOffer { offer_id, today });
        self
    }

    pub fn insert_request(mut self, request: Request) -> Self {
        self.writes.push(Write::InsertRequest(request));
        self
    }

    pub fn transition_request(
        mut self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
    ) -> Self {
        self.writes.push(Write::TransitionRequest { id, from, to, at });
        self
    }

    pub fn insert_notification(mut self, notification: Notification) -> Self {
        self.writes.push(Write::InsertNotification(notification));
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or changed concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
