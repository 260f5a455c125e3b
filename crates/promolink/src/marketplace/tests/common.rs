use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request as HttpRequest, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::marketplace::accounts::{Account, UserId, UserRole};
use crate::marketplace::clock::Clock;
use crate::marketplace::notifications::{Notification, NotificationHub, NotificationId};
use crate::marketplace::offers::{Offer, OfferId, OfferInput};
use crate::marketplace::requests::{Request, RequestId};
use crate::marketplace::router::{marketplace_router, MarketplaceServices};
use crate::marketplace::session::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::marketplace::storage::{InMemoryObjectStore, PhotoStorage};
use crate::marketplace::store::{
    InMemoryMarketplaceStore, MarketplaceStore, RepositoryError, WriteBatch,
};
use crate::marketplace::validation::NumberInput;

pub(super) const SUPPLIER: &str = "supplier-1";
pub(super) const OTHER_SUPPLIER: &str = "supplier-2";
pub(super) const STORE: &str = "store-1";
pub(super) const PHOTO_BASE_URL: &str = "http://localhost:8080/photos";

/// Tuesday 2026-02-10 12:00 UTC.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Clock the tests can move forward.
pub(super) struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub(super) fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub(super) fn advance(&self, step: Duration) {
        let mut guard = self.0.lock().expect("clock mutex poisoned");
        *guard += step;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex poisoned")
    }
}

pub(super) type TestServices = MarketplaceServices<InMemoryMarketplaceStore, InMemoryObjectStore>;

pub(super) struct Harness {
    pub(super) store: Arc<InMemoryMarketplaceStore>,
    pub(super) clock: Arc<TestClock>,
    pub(super) services: Arc<TestServices>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let store = Arc::new(InMemoryMarketplaceStore::new());
        for account in [
            Account::new(SUPPLIER, UserRole::Supplier, "Torréfaction Martin"),
            Account::new(OTHER_SUPPLIER, UserRole::Supplier, "Fromagerie Blanc"),
            Account::new(STORE, UserRole::Store, "Epicerie du Port"),
        ] {
            store.upsert_account(account).expect("seed account");
        }
        let clock = Arc::new(TestClock::at(now()));
        let services = MarketplaceServices::new(
            store.clone(),
            clock.clone(),
            NotificationHub::new(64),
            PhotoStorage::new(InMemoryObjectStore::new(), PHOTO_BASE_URL),
        );
        Self {
            store,
            clock,
            services: Arc::new(services),
        }
    }

    /// Advance one minute so rows created next sort after earlier ones.
    pub(super) fn tick(&self) {
        self.clock.advance(Duration::minutes(1));
    }

    pub(super) fn router(&self) -> axum::Router {
        marketplace_router(self.services.clone())
    }

    pub(super) fn publish_offer(&self, supplier: &str, name: &str) -> Offer {
        self.tick();
        self.services
            .catalog
            .create_offer(&UserId::new(supplier), &offer_input(name))
            .expect("offer created")
    }

    pub(super) fn notifications_for(&self, user: &str, role: UserRole) -> Vec<Notification> {
        self.store
            .notifications(&UserId::new(user), role, 0, 100)
            .expect("notifications")
    }

    pub(super) fn request(&self, id: &RequestId) -> Request {
        self.store
            .fetch_request(id)
            .expect("fetch")
            .expect("request present")
    }
}

/// Valid ACTIVE offer running from today to the end of the month.
pub(super) fn offer_input(name: &str) -> OfferInput {
    OfferInput {
        name: name.to_string(),
        price: Some(NumberInput::from("12.50")),
        discount_percent: Some(NumberInput::from(15_i64)),
        start_date: "2026-02-10".to_string(),
        end_date: "2026-02-28".to_string(),
        category: "EPICERIE".to_string(),
        subcategory: Some("Café".to_string()),
        margin_percent: Some(NumberInput::from("22.5")),
        volume: Some("3 palettes".to_string()),
        conditions: None,
        animation: None,
        photo_url: None,
        status: Some("ACTIVE".to_string()),
    }
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    identity: Option<(&str, UserRole)>,
    body: Option<Value>,
) -> HttpRequest<Body> {
    let mut builder = HttpRequest::builder().method(method).uri(uri);
    if let Some((user, role)) = identity {
        builder = builder
            .header(USER_ID_HEADER, user)
            .header(USER_ROLE_HEADER, role.code());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value).expect("serialize body"))
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub(super) async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

/// Store whose every call fails, to exercise the SERVER_ERROR path.
pub(super) struct UnavailableStore;

fn down<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl MarketplaceStore for UnavailableStore {
    fn account(&self, _id: &UserId) -> Result<Option<Account>, RepositoryError> {
        down()
    }

    fn upsert_account(&self, _account: Account) -> Result<(), RepositoryError> {
        down()
    }

    fn insert_offer(&self, _offer: Offer) -> Result<Offer, RepositoryError> {
        down()
    }

    fn update_offer(&self, _offer: Offer) -> Result<(), RepositoryError> {
        down()
    }

    fn fetch_offer(&self, _id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        down()
    }

    fn active_offers(&self, _today: NaiveDate) -> Result<Vec<Offer>, RepositoryError> {
        down()
    }

    fn supplier_offers(
        &self,
        _supplier_id: &UserId,
        _include_deleted: bool,
    ) -> Result<Vec<Offer>, RepositoryError> {
        down()
    }

    fn expire_offers(
        &self,
        _today: NaiveDate,
        _at: DateTime<Utc>,
    ) -> Result<Vec<OfferId>, RepositoryError> {
        down()
    }

    fn fetch_request(&self, _id: &RequestId) -> Result<Option<Request>, RepositoryError> {
        down()
    }

    fn store_requests(&self, _store_id: &UserId) -> Result<Vec<Request>, RepositoryError> {
        down()
    }

    fn supplier_requests(&self, _supplier_id: &UserId) -> Result<Vec<Request>, RepositoryError> {
        down()
    }

    fn fetch_notification(
        &self,
        _id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        down()
    }

    fn notifications(
        &self,
        _user_id: &UserId,
        _user_type: UserRole,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        down()
    }

    fn count_unread(
        &self,
        _user_id: &UserId,
        _user_type: UserRole,
    ) -> Result<usize, RepositoryError> {
        down()
    }

    fn mark_notification_read(
        &self,
        _id: &NotificationId,
        _at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        down()
    }

    fn mark_all_notifications_read(
        &self,
        _user_id: &UserId,
        _user_type: UserRole,
        _at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        down()
    }

    fn commit(&self, _batch: WriteBatch) -> Result<(), RepositoryError> {
        down()
    }
}
