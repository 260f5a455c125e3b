//! Supplier/store promotion marketplace: offers, requests against them, and the notification
//! inbox that ties the two sides together.

pub mod accounts;
pub mod calendar;
pub mod clock;
pub mod context;
pub mod error;
pub mod extract;
pub mod notifications;
pub mod offers;
pub mod requests;
pub mod router;
pub mod serialization;
pub mod session;
pub mod storage;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use accounts::{Account, UserId, UserRole};
pub use calendar::{DateRange, Period};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ActionResult, ErrorCode, MarketplaceError};
pub use notifications::{
    FeedPage, Notification, NotificationEvent, NotificationFeed, NotificationHub,
    NotificationId, NotificationKind, NotificationSubscription,
};
pub use offers::{
    Offer, OfferCatalog, OfferCategory, OfferFilter, OfferId, OfferInput, OfferListing,
    OfferStatus, OfferUpdateInput, SupplierOfferFilter,
};
pub use requests::{
    Request, RequestDraft, RequestFilter, RequestId, RequestInput, RequestListing,
    RequestStatus, RequestType, RequestWorkflow,
};
pub use router::{marketplace_router, MarketplaceServices};
pub use session::Session;
pub use storage::{
    FileSystemObjectStore, InMemoryObjectStore, ObjectStore, PhotoStorage, StorageError,
    StoredPhoto,
};
pub use store::{InMemoryMarketplaceStore, MarketplaceStore, RepositoryError, WriteBatch};
pub use validation::{Decimal2, FieldError, NumberInput, ValidationError};
