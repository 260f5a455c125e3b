use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{MarketplaceStore, RepositoryError, Write, WriteBatch};
use crate::marketplace::accounts::{Account, UserId, UserRole};
use crate::marketplace::notifications::domain::{Notification, NotificationId};
use crate::marketplace::offers::domain::{Offer, OfferId, OfferStatus};
use crate::marketplace::requests::domain::{Request, RequestId};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<UserId, Account>,
    offers: HashMap<OfferId, Offer>,
    requests: HashMap<RequestId, Request>,
    notifications: HashMap<NotificationId, Notification>,
}

/// Process-local store; all tables sit behind one mutex so a batch commit is atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMarketplaceStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryMarketplaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

fn newest_first<T>(rows: &mut [T], created: impl Fn(&T) -> (DateTime<Utc>, String)) {
    rows.sort_by(|a, b| created(b).cmp(&created(a)));
}

impl MarketplaceStore for InMemoryMarketplaceStore {
    fn account(&self, id: &UserId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.tables()?.accounts.get(id).cloned())
    }

    fn upsert_account(&self, account: Account) -> Result<(), RepositoryError> {
        self.tables()?.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.offers.contains_key(&offer.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.offers.insert(offer.id.clone(), offer.clone());
        Ok(offer)
    }

    fn update_offer(&self, offer: Offer) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.offers.get_mut(&offer.id) {
            Some(existing) => {
                *existing = offer;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        Ok(self.tables()?.offers.get(id).cloned())
    }

    fn active_offers(&self, today: NaiveDate) -> Result<Vec<Offer>, RepositoryError> {
        let tables = self.tables()?;
        let mut offers: Vec<Offer> = tables
            .offers
            .values()
            .filter(|offer| offer.is_available_on(today))
            .cloned()
            .collect();
        newest_first(&mut offers, |offer| (offer.created_at, offer.id.0.clone()));
        Ok(offers)
    }

    fn supplier_offers(
        &self,
        supplier_id: &UserId,
        include_deleted: bool,
    ) -> Result<Vec<Offer>, RepositoryError> {
        let tables = self.tables()?;
        let mut offers: Vec<Offer> = tables
            .offers
            .values()
            .filter(|offer| offer.is_owned_by(supplier_id))
            .filter(|offer| include_deleted || !offer.is_deleted())
            .cloned()
            .collect();
        newest_first(&mut offers, |offer| (offer.created_at, offer.id.0.clone()));
        Ok(offers)
    }

    fn expire_offers(
        &self,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Vec<OfferId>, RepositoryError> {
        let mut tables = self.tables()?;
        let mut expired = Vec::new();
        for offer in tables.offers.values_mut() {
            if offer.is_lapsed_on(today) {
                offer.status = OfferStatus::Expired;
                offer.updated_at = at;
                expired.push(offer.id.clone());
            }
        }
        expired.sort();
        Ok(expired)
    }

    fn fetch_request(&self, id: &RequestId) -> Result<Option<Request>, RepositoryError> {
        Ok(self.tables()?.requests.get(id).cloned())
    }

    fn store_requests(&self, store_id: &UserId) -> Result<Vec<Request>, RepositoryError> {
        let tables = self.tables()?;
        let mut requests: Vec<Request> = tables
            .requests
            .values()
            .filter(|request| &request.store_id == store_id)
            .cloned()
            .collect();
        newest_first(&mut requests, |request| {
            (request.created_at, request.id.0.clone())
        });
        Ok(requests)
    }

    fn supplier_requests(&self, supplier_id: &UserId) -> Result<Vec<Request>, RepositoryError> {
        let tables = self.tables()?;
        let mut requests: Vec<Request> = tables
            .requests
            .values()
            .filter(|request| &request.supplier_id == supplier_id)
            .cloned()
            .collect();
        newest_first(&mut requests, |request| {
            (request.created_at, request.id.0.clone())
        });
        Ok(requests)
    }

    fn fetch_notification(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        Ok(self.tables()?.notifications.get(id).cloned())
    }

    fn notifications(
        &self,
        user_id: &UserId,
        user_type: UserRole,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let tables = self.tables()?;
        let mut rows: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|notification| notification.is_addressed_to(user_id, user_type))
            .cloned()
            .collect();
        newest_first(&mut rows, |notification| {
            (notification.created_at, notification.id.0.clone())
        });
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    fn count_unread(
        &self,
        user_id: &UserId,
        user_type: UserRole,
    ) -> Result<usize, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .notifications
            .values()
            .filter(|notification| notification.is_addressed_to(user_id, user_type))
            .filter(|notification| !notification.read)
            .count())
    }

    fn mark_notification_read(
        &self,
        id: &NotificationId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables()?;
        let notification = tables
            .notifications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if notification.read {
            return Ok(false);
        }
        notification.read = true;
        notification.updated_at = at;
        Ok(true)
    }

    fn mark_all_notifications_read(
        &self,
        user_id: &UserId,
        user_type: UserRole,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let mut changed = 0;
        for notification in tables.notifications.values_mut() {
            if notification.is_addressed_to(user_id, user_type) && !notification.read {
                notification.read = true;
                notification.updated_at = at;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        check_preconditions(&tables, batch.writes())?;

        for write in batch.into_writes() {
            match write {
                Write::RequireAvailableOffer { .. } => {}
                Write::InsertRequest(request) => {
                    tables.requests.insert(request.id.clone(), request);
                }
                Write::TransitionRequest { id, to, at, .. } => {
                    if let Some(request) = tables.requests.get_mut(&id) {
                        request.status = to;
                        request.updated_at = at;
                    }
                }
                Write::InsertNotification(notification) => {
                    tables
                        .notifications
                        .insert(notification.id.clone(), notification);
                }
            }
        }
        Ok(())
    }
}

/// Every write is checked against the current tables and the writes queued before it.
fn check_preconditions(tables: &Tables, writes: &[Write]) -> Result<(), RepositoryError> {
    let mut new_requests: HashMap<&RequestId, &Request> = HashMap::new();
    let mut transitioned: HashSet<&RequestId> = HashSet::new();
    let mut new_notifications: HashSet<&NotificationId> = HashSet::new();

    for write in writes {
        match write {
            Write::RequireAvailableOffer { offer_id, today } => {
                tables
                    .offers
                    .get(offer_id)
                    .filter(|offer| offer.is_available_on(*today))
                    .ok_or(RepositoryError::NotFound)?;
            }
            Write::InsertRequest(request) => {
                if tables.requests.contains_key(&request.id)
                    || new_requests.insert(&request.id, request).is_some()
                {
                    return Err(RepositoryError::Conflict);
                }
            }
            Write::TransitionRequest { id, from, to, .. } => {
                let current = tables
                    .requests
                    .get(id)
                    .or_else(|| new_requests.get(id).copied())
                    .ok_or(RepositoryError::NotFound)?;
                if current.status != *from
                    || !from.can_transition_to(*to)
                    || !transitioned.insert(id)
                {
                    return Err(RepositoryError::Conflict);
                }
            }
            Write::InsertNotification(notification) => {
                if tables.notifications.contains_key(&notification.id)
                    || !new_notifications.insert(&notification.id)
                {
                    return Err(RepositoryError::Conflict);
                }
            }
        }
    }
    Ok(())
}
