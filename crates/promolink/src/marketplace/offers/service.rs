use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::domain::{Offer, OfferCategory, OfferId, OfferStatus};
use super::validation::{
    validate_offer_create, validate_offer_update, OfferFields, OfferInput, OfferUpdateInput,
};
use crate::marketplace::accounts::UserId;
use crate::marketplace::calendar::Period;
use crate::marketplace::clock::Clock;
use crate::marketplace::context::OperationContext;
use crate::marketplace::error::MarketplaceError;
use crate::marketplace::store::MarketplaceStore;

/// Offer as shown to stores, with the publishing supplier's name joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferListing {
    pub offer: Offer,
    pub supplier_name: String,
}

/// Narrowing applied on top of the availability rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OfferFilter {
    #[serde(default)]
    pub category: Option<OfferCategory>,
    #[serde(default)]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SupplierOfferFilter {
    #[serde(default)]
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub include_deleted: bool,
}

/// Supplier-side offer management and the store-facing catalog.
pub struct OfferCatalog<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> OfferCatalog<S>
where
    S: MarketplaceStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn create_offer(
        &self,
        supplier_id: &UserId,
        input: &OfferInput,
    ) -> Result<Offer, MarketplaceError> {
        let now = self.clock.now();
        let fields = validate_offer_create(input, now.date_naive())?;
        let offer = Offer {
            id: OfferId::generate(),
            supplier_id: supplier_id.clone(),
            name: fields.name,
            price: fields.price,
            discount_percent: fields.discount_percent,
            start_date: fields.start_date,
            end_date: fields.end_date,
            category: fields.category,
            subcategory: fields.subcategory,
            margin_percent: fields.margin_percent,
            volume: fields.volume,
            conditions: fields.conditions,
            animation: fields.animation,
            photo_url: fields.photo_url,
            status: fields.status,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let offer = self.store.insert_offer(offer)?;
        info!(
            offer_id = %offer.id,
            supplier_id = %supplier_id,
            status = offer.status.code(),
            "offer created"
        );
        Ok(offer)
    }

    /// Replace every editable attribute of a live offer owned by `supplier_id`.
    pub fn update_offer(
        &self,
        supplier_id: &UserId,
        input: &OfferUpdateInput,
    ) -> Result<Offer, MarketplaceError> {
        let (id, fields) = validate_offer_update(input)?;
        let existing = self.owned_live_offer(supplier_id, &id)?;
        let mut offer = apply_fields(existing, fields);
        offer.updated_at = self.clock.now();
        self.store.update_offer(offer.clone())?;
        info!(offer_id = %offer.id, status = offer.status.code(), "offer updated");
        Ok(offer)
    }

    /// Soft-delete: the row stays, stamped with the deletion time.
    pub fn delete_offer(
        &self,
        supplier_id: &UserId,
        id: &OfferId,
    ) -> Result<Offer, MarketplaceError> {
        let mut offer = self.owned_live_offer(supplier_id, id)?;
        let now = self.clock.now();
        offer.deleted_at = Some(now);
        offer.updated_at = now;
        self.store.update_offer(offer.clone())?;
        info!(offer_id = %offer.id, supplier_id = %supplier_id, "offer deleted");
        Ok(offer)
    }

    /// Owners see their live offers in any status; everyone else only sees available ones.
    pub fn get_offer(
        &self,
        viewer: &UserId,
        id: &OfferId,
    ) -> Result<OfferListing, MarketplaceError> {
        let context = OperationContext::new(self.store.as_ref());
        let offer = context
            .offer(id)?
            .filter(|offer| !offer.is_deleted())
            .filter(|offer| offer.is_owned_by(viewer) || offer.is_available_on(self.clock.today()))
            .ok_or(MarketplaceError::NotFound("offer"))?;
        let supplier_name = context.display_name(&offer.supplier_id)?;
        Ok(OfferListing {
            offer,
            supplier_name,
        })
    }

    pub fn list_active_offers(&self) -> Result<Vec<OfferListing>, MarketplaceError> {
        self.list_active_offers_filtered(&OfferFilter::default())
    }

    pub fn list_active_offers_filtered(
        &self,
        filter: &OfferFilter,
    ) -> Result<Vec<OfferListing>, MarketplaceError> {
        let now = self.clock.now();
        let window = filter.period.map(|period| period.range_at(now));
        let context = OperationContext::new(self.store.as_ref());

        self.store
            .active_offers(now.date_naive())?
            .into_iter()
            .filter(|offer| filter.category.map_or(true, |category| offer.category == category))
            .filter(|offer| window.map_or(true, |window| offer.validity().overlaps(&window)))
            .map(|offer| {
                let supplier_name = context.display_name(&offer.supplier_id)?;
                Ok::<_, MarketplaceError>(OfferListing {
                    offer,
                    supplier_name,
                })
            })
            .collect()
    }

    pub fn list_supplier_offers(
        &self,
        supplier_id: &UserId,
        filter: &SupplierOfferFilter,
    ) -> Result<Vec<Offer>, MarketplaceError> {
        let window = filter.period.map(|period| period.range_at(self.clock.now()));
        Ok(self
            .store
            .supplier_offers(supplier_id, filter.include_deleted)?
            .into_iter()
            .filter(|offer| filter.status.map_or(true, |status| offer.status == status))
            .filter(|offer| window.map_or(true, |window| offer.validity().overlaps(&window)))
            .collect())
    }

    /// Move ACTIVE offers whose last day has passed to EXPIRED.
    pub fn expire_lapsed_offers(&self) -> Result<Vec<OfferId>, MarketplaceError> {
        let now = self.clock.now();
        let expired = self.store.expire_offers(now.date_naive(), now)?;
        if !expired.is_empty() {
            info!(count = expired.len(), "expired lapsed offers");
        }
        Ok(expired)
    }

    fn owned_live_offer(
        &self,
        supplier_id: &UserId,
        id: &OfferId,
    ) -> Result<Offer, MarketplaceError> {
        let offer = self
            .store
            .fetch_offer(id)?
            .ok_or(MarketplaceError::NotFound("offer"))?;
        if !offer.is_owned_by(supplier_id) {
            return Err(MarketplaceError::forbidden(
                "only the publishing supplier can change this offer",
            ));
        }
        if offer.is_deleted() {
            return Err(MarketplaceError::NotFound("offer"));
        }
        Ok(offer)
    }
}

fn apply_fields(offer: Offer, fields: OfferFields) -> Offer {
    Offer {
        name: fields.name,
        price: fields.price,
        discount_percent: fields.discount_percent,
        start_date: fields.start_date,
        end_date: fields.end_date,
        category: fields.category,
        subcategory: fields.subcategory,
        margin_percent: fields.margin_percent,
        volume: fields.volume,
        conditions: fields.conditions,
        animation: fields.animation,
        photo_url: fields.photo_url,
        status: fields.status,
        ..offer
    }
}
