use super::common::*;
use chrono::Duration;

use crate::marketplace::accounts::UserId;
use crate::marketplace::calendar::Period;
use crate::marketplace::error::ErrorCode;
use crate::marketplace::offers::{
    OfferCatalog, OfferCategory, OfferFilter, OfferStatus, OfferUpdateInput, SupplierOfferFilter,
};
use crate::marketplace::store::MarketplaceStore;
use crate::marketplace::validation::Decimal2;
use std::sync::Arc;

fn names(listings: &[crate::marketplace::offers::OfferListing]) -> Vec<&str> {
    listings
        .iter()
        .map(|listing| listing.offer.name.as_str())
        .collect()
}

#[test]
fn create_offer_persists_validated_fields() {
    let harness = Harness::new();
    let offer = harness.publish_offer(SUPPLIER, "Café moulu 250g");

    assert_eq!(offer.supplier_id, UserId::new(SUPPLIER));
    assert_eq!(offer.status, OfferStatus::Active);
    assert_eq!(offer.price, Decimal2::from_hundredths(1250));
    assert_eq!(offer.margin_percent, Some(Decimal2::from_hundredths(2250)));
    assert!(uuid::Uuid::parse_str(&offer.id.0).is_ok());
    assert_eq!(
        harness.store.fetch_offer(&offer.id).expect("fetch"),
        Some(offer)
    );
}

#[test]
fn create_offer_rejects_invalid_form_without_writing() {
    let harness = Harness::new();
    let mut input = offer_input("ab");
    input.start_date = "2026-02-09".to_string();

    let err = harness
        .services
        .catalog
        .create_offer(&UserId::new(SUPPLIER), &input)
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::Validation);
    let fields: Vec<&str> = err.fields().iter().map(|field| field.field).collect();
    assert_eq!(fields, vec!["name", "start_date"]);
    assert!(harness
        .store
        .supplier_offers(&UserId::new(SUPPLIER), true)
        .expect("query")
        .is_empty());
}

#[test]
fn active_listing_is_newest_first_with_supplier_names() {
    let harness = Harness::new();
    harness.publish_offer(SUPPLIER, "Café moulu 250g");
    harness.publish_offer(OTHER_SUPPLIER, "Comté 18 mois");
    let mut draft = offer_input("Brouillon");
    draft.status = None;
    harness
        .services
        .catalog
        .create_offer(&UserId::new(SUPPLIER), &draft)
        .expect("draft created");

    let listings = harness.services.catalog.list_active_offers().expect("list");
    assert_eq!(names(&listings), vec!["Comté 18 mois", "Café moulu 250g"]);
    assert_eq!(listings[0].supplier_name, "Fromagerie Blanc");
    assert_eq!(listings[1].supplier_name, "Torréfaction Martin");
}

#[test]
fn availability_ends_after_the_last_day() {
    let harness = Harness::new();
    let mut input = offer_input("Dernier jour");
    input.end_date = "2026-02-10".to_string();
    let offer = harness
        .services
        .catalog
        .create_offer(&UserId::new(SUPPLIER), &input)
        .expect("created");

    assert_eq!(
        names(&harness.services.catalog.list_active_offers().expect("list")),
        vec!["Dernier jour"]
    );

    harness.clock.advance(Duration::days(1));
    assert!(harness
        .services
        .catalog
        .list_active_offers()
        .expect("list")
        .is_empty());

    let expired = harness
        .services
        .catalog
        .expire_lapsed_offers()
        .expect("sweep");
    assert_eq!(expired, vec![offer.id.clone()]);
    let stored = harness
        .store
        .fetch_offer(&offer.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, OfferStatus::Expired);
}

#[test]
fn filters_by_category_and_period() {
    let harness = Harness::new();
    harness.publish_offer(SUPPLIER, "Café moulu 250g");

    let mut later = offer_input("Jus de pomme");
    later.category = "BOISSONS".to_string();
    later.start_date = "2026-02-20".to_string();
    later.end_date = "2026-03-10".to_string();
    harness.tick();
    harness
        .services
        .catalog
        .create_offer(&UserId::new(SUPPLIER), &later)
        .expect("created");

    let catalog = &harness.services.catalog;
    let drinks = catalog
        .list_active_offers_filtered(&OfferFilter {
            category: Some(OfferCategory::Boissons),
            period: None,
        })
        .expect("list");
    assert_eq!(names(&drinks), vec!["Jus de pomme"]);

    let this_week = catalog
        .list_active_offers_filtered(&OfferFilter {
            category: None,
            period: Some(Period::Week),
        })
        .expect("list");
    assert_eq!(names(&this_week), vec!["Café moulu 250g"]);

    let this_month = catalog
        .list_active_offers_filtered(&OfferFilter {
            category: None,
            period: Some(Period::Month),
        })
        .expect("list");
    assert_eq!(this_month.len(), 2);
}

#[test]
fn only_the_owner_can_update_or_delete() {
    let harness = Harness::new();
    let offer = harness.publish_offer(SUPPLIER, "Café moulu 250g");
    let mut fields = offer_input("Café moulu 500g");
    fields.price = Some("19.90".into());
    let update = OfferUpdateInput {
        id: offer.id.0.clone(),
        fields,
    };

    let err = harness
        .services
        .catalog
        .update_offer(&UserId::new(OTHER_SUPPLIER), &update)
        .expect_err("foreign supplier");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    let err = harness
        .services
        .catalog
        .delete_offer(&UserId::new(OTHER_SUPPLIER), &offer.id)
        .expect_err("foreign supplier");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(
        harness.store.fetch_offer(&offer.id).expect("fetch"),
        Some(offer.clone())
    );

    harness.tick();
    let updated = harness
        .services
        .catalog
        .update_offer(&UserId::new(SUPPLIER), &update)
        .expect("owner updates");
    assert_eq!(updated.name, "Café moulu 500g");
    assert_eq!(updated.price, Decimal2::from_hundredths(1990));
    assert_eq!(updated.created_at, offer.created_at);
    assert!(updated.updated_at > offer.updated_at);
}

#[test]
fn soft_delete_hides_offer_but_keeps_row() {
    let harness = Harness::new();
    let offer = harness.publish_offer(SUPPLIER, "Café moulu 250g");
    let supplier = UserId::new(SUPPLIER);

    let deleted = harness
        .services
        .catalog
        .delete_offer(&supplier, &offer.id)
        .expect("deleted");
    assert!(deleted.deleted_at.is_some());

    let catalog = &harness.services.catalog;
    assert!(catalog.list_active_offers().expect("list").is_empty());
    assert!(catalog
        .list_supplier_offers(&supplier, &SupplierOfferFilter::default())
        .expect("list")
        .is_empty());
    let with_deleted = catalog
        .list_supplier_offers(
            &supplier,
            &SupplierOfferFilter {
                include_deleted: true,
                ..SupplierOfferFilter::default()
            },
        )
        .expect("list");
    assert_eq!(with_deleted.len(), 1);

    let err = catalog
        .delete_offer(&supplier, &offer.id)
        .expect_err("already deleted");
    assert_eq!(err.code(), ErrorCode::NotFound);
    let err = catalog
        .get_offer(&supplier, &offer.id)
        .expect_err("deleted offers are hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn drafts_are_visible_to_their_owner_only() {
    let harness = Harness::new();
    let mut draft = offer_input("Brouillon");
    draft.status = Some("DRAFT".to_string());
    let offer = harness
        .services
        .catalog
        .create_offer(&UserId::new(SUPPLIER), &draft)
        .expect("created");

    let catalog = &harness.services.catalog;
    let own = catalog
        .get_offer(&UserId::new(SUPPLIER), &offer.id)
        .expect("owner sees draft");
    assert_eq!(own.supplier_name, "Torréfaction Martin");
    let err = catalog
        .get_offer(&UserId::new(STORE), &offer.id)
        .expect_err("store cannot see drafts");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let drafts = catalog
        .list_supplier_offers(
            &UserId::new(SUPPLIER),
            &SupplierOfferFilter {
                status: Some(OfferStatus::Draft),
                ..SupplierOfferFilter::default()
            },
        )
        .expect("list");
    assert_eq!(drafts.len(), 1);
}

#[test]
fn store_failures_surface_as_server_errors() {
    let catalog = OfferCatalog::new(Arc::new(UnavailableStore), Arc::new(TestClock::at(now())));
    let err = catalog.list_active_offers().expect_err("store down");
    assert_eq!(err.code(), ErrorCode::Server);
    let err = catalog
        .create_offer(&UserId::new(SUPPLIER), &offer_input("Café moulu 250g"))
        .expect_err("store down");
    assert_eq!(err.code(), ErrorCode::Server);
}
