//! Supplier offers: the form schema, the availability rule and the catalog service.

pub mod domain;
pub mod service;
pub mod validation;

pub use domain::{Offer, OfferCategory, OfferId, OfferStatus};
pub use service::{OfferCatalog, OfferFilter, OfferListing, SupplierOfferFilter};
pub use validation::{
    validate_offer_create, validate_offer_update, OfferFields, OfferInput, OfferUpdateInput,
};
