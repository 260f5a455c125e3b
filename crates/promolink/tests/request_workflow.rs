//! End-to-end scenarios for the offer → request → notification cycle, driven only through the
//! public service facade.

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};

use promolink::marketplace::{
    Account, ErrorCode, FixedClock, InMemoryMarketplaceStore, InMemoryObjectStore,
    MarketplaceServices, MarketplaceStore, NotificationHub, NotificationKind, NumberInput,
    OfferInput, PhotoStorage, RequestDraft, RequestStatus, RequestType, UserId, UserRole,
};

type Services = MarketplaceServices<InMemoryMarketplaceStore, InMemoryObjectStore>;

fn services() -> (Arc<InMemoryMarketplaceStore>, Services) {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    store
        .upsert_account(Account::new(
            "supplier-1",
            UserRole::Supplier,
            "Brasserie du Nord",
        ))
        .expect("seed supplier");
    store
        .upsert_account(Account::new("store-1", UserRole::Store, "Cave Saint-Roch"))
        .expect("seed store");
    let now = Utc
        .with_ymd_and_hms(2026, 3, 4, 9, 30, 0)
        .single()
        .expect("valid instant");
    let services = MarketplaceServices::new(
        store.clone(),
        Arc::new(FixedClock(now)),
        NotificationHub::new(16),
        PhotoStorage::new(InMemoryObjectStore::new(), "https://cdn.example.test/photos"),
    );
    (store, services)
}

fn beer_offer() -> OfferInput {
    OfferInput {
        name: "Bière blonde 6x33cl".to_string(),
        price: Some(NumberInput::from("7.90")),
        discount_percent: Some(NumberInput::from(20_i64)),
        start_date: "2026-03-01".to_string(),
        end_date: "2026-03-31".to_string(),
        category: "BOISSONS".to_string(),
        subcategory: None,
        margin_percent: None,
        volume: None,
        conditions: Some("Minimum 10 packs".to_string()),
        animation: None,
        photo_url: None,
        status: Some("ACTIVE".to_string()),
    }
}

#[test]
fn store_request_reaches_supplier_and_treatment_reaches_store() {
    let (store, services) = services();
    let supplier = UserId::new("supplier-1");
    let shop = UserId::new("store-1");

    let offer = services
        .catalog
        .create_offer(&supplier, &beer_offer())
        .expect("offer published");
    let listings = services.catalog.list_active_offers().expect("list");
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].supplier_name, "Brasserie du Nord");

    let request = services
        .requests
        .create_request(&shop, RequestDraft::new(offer.id.clone(), RequestType::Order))
        .expect("request sent");
    assert_eq!(services.feed.count_unread(&supplier, UserRole::Supplier).expect("count"), 1);
    assert_eq!(services.feed.count_unread(&shop, UserRole::Store).expect("count"), 0);

    services
        .requests
        .mark_request_treated(&request.id, &supplier)
        .expect("treated");
    let inbox = services
        .feed
        .list(&shop, UserRole::Store, 0, None)
        .expect("inbox");
    assert_eq!(inbox.notifications.len(), 1);
    let notification = &inbox.notifications[0];
    assert_eq!(notification.kind, NotificationKind::RequestTreated);
    assert_eq!(notification.title, "Your request was treated");
    assert!(notification.body.contains("Brasserie du Nord"));
    assert!(notification.body.contains("Bière blonde 6x33cl"));
    assert!(!notification.read);

    let stored = store
        .fetch_request(&request.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, RequestStatus::Treated);
}

#[test]
fn concurrent_treatment_succeeds_exactly_once() {
    let (store, services) = services();
    let supplier = UserId::new("supplier-1");
    let shop = UserId::new("store-1");
    let offer = services
        .catalog
        .create_offer(&supplier, &beer_offer())
        .expect("offer published");
    let request = services
        .requests
        .create_request(&shop, RequestDraft::new(offer.id, RequestType::Info))
        .expect("request sent");

    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| services.requests.mark_request_treated(&request.id, &supplier))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread finished"))
            .collect()
    });

    let succeeded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(succeeded, 1);
    for outcome in outcomes.iter().filter(|outcome| outcome.is_err()) {
        let err = outcome.as_ref().expect_err("failed outcome");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }
    assert_eq!(
        store
            .notifications(&shop, UserRole::Store, 0, 10)
            .expect("notifications")
            .len(),
        1
    );
}
