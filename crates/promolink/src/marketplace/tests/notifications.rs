use super::common::*;

use crate::marketplace::accounts::{UserId, UserRole};
use crate::marketplace::error::ErrorCode;
use crate::marketplace::notifications::NotificationId;
use crate::marketplace::requests::{RequestDraft, RequestType};

/// Three NEW_REQUEST notifications for the supplier, one minute apart.
fn harness_with_inbox() -> Harness {
    let harness = Harness::new();
    let offer = harness.publish_offer(SUPPLIER, "Café moulu 250g");
    for _ in 0..3 {
        harness.tick();
        harness
            .services
            .requests
            .create_request(
                &UserId::new(STORE),
                RequestDraft::new(offer.id.clone(), RequestType::Info),
            )
            .expect("request created");
    }
    harness
}

#[test]
fn feed_pages_newest_first_and_flags_more() {
    let harness = harness_with_inbox();
    let supplier = UserId::new(SUPPLIER);
    let feed = &harness.services.feed;

    let first = feed
        .list(&supplier, UserRole::Supplier, 0, Some(2))
        .expect("page");
    assert_eq!(first.notifications.len(), 2);
    assert!(first.has_more);
    assert!(first.notifications[0].created_at > first.notifications[1].created_at);

    let second = feed
        .list(&supplier, UserRole::Supplier, 2, Some(2))
        .expect("page");
    assert_eq!(second.notifications.len(), 1);
    assert!(!second.has_more);

    let default_page = feed
        .list(&supplier, UserRole::Supplier, 0, None)
        .expect("page");
    assert_eq!(default_page.notifications.len(), 3);
    assert!(!default_page.has_more);
}

#[test]
fn feed_is_scoped_to_recipient_and_type() {
    let harness = harness_with_inbox();
    let feed = &harness.services.feed;
    let page = feed
        .list(&UserId::new(SUPPLIER), UserRole::Store, 0, None)
        .expect("page");
    assert!(page.notifications.is_empty());
    assert_eq!(
        feed.count_unread(&UserId::new(STORE), UserRole::Store)
            .expect("count"),
        0
    );
}

#[test]
fn mark_read_is_recipient_only_and_idempotent() {
    let harness = harness_with_inbox();
    let supplier = UserId::new(SUPPLIER);
    let feed = &harness.services.feed;
    let target = harness.notifications_for(SUPPLIER, UserRole::Supplier)[0].clone();

    let err = feed
        .mark_read(&target.id, &UserId::new(STORE))
        .expect_err("not the recipient");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    let err = feed
        .mark_read(&NotificationId("missing".to_string()), &supplier)
        .expect_err("unknown id");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(
        feed.count_unread(&supplier, UserRole::Supplier).expect("count"),
        3
    );

    harness.tick();
    let read = feed.mark_read(&target.id, &supplier).expect("marked");
    assert!(read.read);
    let again = feed.mark_read(&target.id, &supplier).expect("still read");
    assert!(again.read);
    assert_eq!(again.updated_at, read.updated_at);
    assert_eq!(
        feed.count_unread(&supplier, UserRole::Supplier).expect("count"),
        2
    );
}

#[test]
fn mark_all_read_clears_only_own_inbox() {
    let harness = harness_with_inbox();
    let supplier = UserId::new(SUPPLIER);
    let feed = &harness.services.feed;

    assert_eq!(
        feed.mark_all_read(&supplier, UserRole::Supplier)
            .expect("marked"),
        3
    );
    assert_eq!(
        feed.mark_all_read(&supplier, UserRole::Supplier)
            .expect("marked again"),
        0
    );
    assert_eq!(
        feed.count_unread(&supplier, UserRole::Supplier).expect("count"),
        0
    );
    assert!(harness
        .notifications_for(SUPPLIER, UserRole::Supplier)
        .iter()
        .all(|notification| notification.read));
}
