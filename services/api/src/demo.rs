use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use promolink::error::AppError;
use promolink::marketplace::serialization::iso_timestamp;
use promolink::marketplace::{
    Account, FixedClock, InMemoryMarketplaceStore, InMemoryObjectStore, MarketplaceError,
    MarketplaceServices, MarketplaceStore, Notification, NotificationHub, NumberInput, Offer,
    OfferInput, PhotoStorage, Request, RequestDraft, RequestType, UserId, UserRole,
};
use std::sync::Arc;

const DEMO_SUPPLIER: &str = "supplier-demo";
const DEMO_STORE: &str = "store-demo";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the scenario (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Stop after the store sends its request.
    #[arg(long)]
    pub(crate) skip_treatment: bool,
}

pub(crate) struct DemoOutcome {
    pub(crate) offer: Offer,
    pub(crate) request: Request,
    pub(crate) supplier_inbox: Vec<Notification>,
    pub(crate) store_inbox: Vec<Notification>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = match args.today {
        Some(day) => noon(day),
        None => Utc::now(),
    };
    let outcome = run_scenario(now, args.skip_treatment)?;

    println!("Promolink marketplace demo ({})", iso_timestamp(now));
    println!(
        "- Offer \"{}\" at {} (-{}%) from {} until {}",
        outcome.offer.name,
        outcome.offer.price,
        outcome.offer.discount_percent,
        outcome.offer.start_date,
        outcome.offer.end_date
    );
    println!(
        "- {} request {} is {}",
        outcome.request.request_type.code(),
        outcome.request.id,
        outcome.request.status.code()
    );
    print_inbox("Supplier inbox", &outcome.supplier_inbox);
    print_inbox("Store inbox", &outcome.store_inbox);
    Ok(())
}

fn print_inbox(label: &str, inbox: &[Notification]) {
    println!("\n{label} ({} notifications)", inbox.len());
    for notification in inbox {
        println!(
            "  - [{}] {}: {}",
            notification.kind.code(),
            notification.title,
            notification.body
        );
    }
}

fn noon(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::default()).and_utc() + Duration::hours(12)
}

/// Seed two accounts, publish an offer, send a request against it and optionally treat it.
pub(crate) fn run_scenario(
    now: DateTime<Utc>,
    skip_treatment: bool,
) -> Result<DemoOutcome, AppError> {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    store
        .upsert_account(Account::new(
            DEMO_SUPPLIER,
            UserRole::Supplier,
            "Biscuiterie de l'Ouest",
        ))
        .map_err(MarketplaceError::from)?;
    store
        .upsert_account(Account::new(DEMO_STORE, UserRole::Store, "Supérette Centrale"))
        .map_err(MarketplaceError::from)?;

    let services = MarketplaceServices::new(
        store.clone(),
        Arc::new(FixedClock(now)),
        NotificationHub::default(),
        PhotoStorage::new(InMemoryObjectStore::new(), "http://localhost:3000/photos"),
    );
    let supplier = UserId::new(DEMO_SUPPLIER);
    let shop = UserId::new(DEMO_STORE);

    let today = now.date_naive();
    let offer = services
        .catalog
        .create_offer(&supplier, &demo_offer(today))?;
    let request = services.requests.create_request(
        &shop,
        RequestDraft::new(offer.id.clone(), RequestType::Order)
            .with_message("Can you deliver 20 cartons next week?"),
    )?;
    let request = if skip_treatment {
        request
    } else {
        services.requests.mark_request_treated(&request.id, &supplier)?
    };

    let supplier_inbox = services
        .feed
        .list(&supplier, UserRole::Supplier, 0, None)?
        .notifications;
    let store_inbox = services
        .feed
        .list(&shop, UserRole::Store, 0, None)?
        .notifications;

    Ok(DemoOutcome {
        offer,
        request,
        supplier_inbox,
        store_inbox,
    })
}

fn demo_offer(today: NaiveDate) -> OfferInput {
    OfferInput {
        name: "Galettes pur beurre 500g".to_string(),
        price: Some(NumberInput::from("4.20")),
        discount_percent: Some(NumberInput::from(25_i64)),
        start_date: today.format("%Y-%m-%d").to_string(),
        end_date: (today + Duration::days(14)).format("%Y-%m-%d").to_string(),
        category: "EPICERIE".to_string(),
        subcategory: Some("Biscuits".to_string()),
        margin_percent: Some(NumberInput::from("18")),
        volume: Some("40 cartons".to_string()),
        conditions: Some("Minimum 5 cartons per delivery".to_string()),
        animation: Some("Tasting stand on Saturdays".to_string()),
        photo_url: None,
        status: Some("ACTIVE".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promolink::marketplace::{NotificationKind, RequestStatus};

    fn reference_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).expect("valid date")
    }

    #[test]
    fn scenario_notifies_both_sides() {
        let outcome = run_scenario(noon(reference_day()), false).expect("scenario runs");
        assert_eq!(outcome.request.status, RequestStatus::Treated);
        assert_eq!(outcome.supplier_inbox.len(), 1);
        assert_eq!(outcome.supplier_inbox[0].kind, NotificationKind::NewRequest);
        assert!(outcome.supplier_inbox[0].body.contains("Supérette Centrale"));
        assert_eq!(outcome.store_inbox.len(), 1);
        assert_eq!(outcome.store_inbox[0].kind, NotificationKind::RequestTreated);
    }

    #[test]
    fn skipping_treatment_leaves_store_inbox_empty() {
        let outcome = run_scenario(noon(reference_day()), true).expect("scenario runs");
        assert_eq!(outcome.request.status, RequestStatus::Pending);
        assert!(outcome.store_inbox.is_empty());
    }
}
