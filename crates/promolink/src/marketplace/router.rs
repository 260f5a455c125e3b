use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::{Stream, StreamExt};

use super::accounts::UserRole;
use super::clock::Clock;
use super::error::{ActionResult, MarketplaceError};
use super::extract::{Json, Query};
use super::notifications::{NotificationFeed, NotificationHub, NotificationId};
use super::offers::{
    OfferCatalog, OfferFilter, OfferId, OfferInput, OfferUpdateInput, SupplierOfferFilter,
};
use super::requests::{
    validate_request_input, RequestFilter, RequestId, RequestInput, RequestWorkflow,
};
use super::serialization::{FeedPageView, NotificationView, OfferView, RequestView};
use super::session::Session;
use super::storage::{ObjectStore, PhotoStorage, StoredPhoto};
use super::store::MarketplaceStore;

pub const MAX_PAGE_SIZE: usize = 200;

/// Every marketplace service wired against one store and one object store.
pub struct MarketplaceServices<S, O> {
    pub catalog: OfferCatalog<S>,
    pub requests: RequestWorkflow<S>,
    pub feed: NotificationFeed<S>,
    pub photos: PhotoStorage<O>,
    pub hub: NotificationHub,
}

impl<S, O> MarketplaceServices<S, O>
where
    S: MarketplaceStore,
    O: ObjectStore,
{
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        hub: NotificationHub,
        photos: PhotoStorage<O>,
    ) -> Self {
        Self {
            catalog: OfferCatalog::new(store.clone(), clock.clone()),
            requests: RequestWorkflow::new(store.clone(), clock.clone(), hub.clone()),
            feed: NotificationFeed::new(store, clock),
            photos,
            hub,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.feed = self.feed.with_page_size(page_size);
        self
    }
}

/// JSON API for offers, photos, requests and the notification inbox.
pub fn marketplace_router<S, O>(services: Arc<MarketplaceServices<S, O>>) -> Router
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/offers",
            get(list_offers_handler::<S, O>).post(create_offer_handler::<S, O>),
        )
        .route(
            "/api/v1/offers/:offer_id",
            get(get_offer_handler::<S, O>)
                .put(update_offer_handler::<S, O>)
                .delete(delete_offer_handler::<S, O>),
        )
        .route(
            "/api/v1/supplier/offers",
            get(supplier_offers_handler::<S, O>),
        )
        .route(
            "/api/v1/photos",
            post(upload_photo_handler::<S, O>).delete(delete_photo_handler::<S, O>),
        )
        .route("/photos/*path", get(serve_photo_handler::<S, O>))
        .route(
            "/api/v1/requests",
            get(list_requests_handler::<S, O>).post(create_request_handler::<S, O>),
        )
        .route(
            "/api/v1/requests/:request_id/treat",
            post(treat_request_handler::<S, O>),
        )
        .route("/api/v1/notifications", get(list_notifications_handler::<S, O>))
        .route(
            "/api/v1/notifications/unread-count",
            get(unread_count_handler::<S, O>),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(mark_all_read_handler::<S, O>),
        )
        .route(
            "/api/v1/notifications/stream",
            get(notification_stream_handler::<S, O>),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<S, O>),
        )
        .with_state(services)
}

type Services<S, O> = State<Arc<MarketplaceServices<S, O>>>;

pub(crate) async fn list_offers_handler<S, O>(
    State(services): Services<S, O>,
    _session: Session,
    Query(filter): Query<OfferFilter>,
) -> ActionResult<Vec<OfferView>>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    services
        .catalog
        .list_active_offers_filtered(&filter)
        .map(|listings| listings.iter().map(OfferView::from).collect::<Vec<_>>())
        .into()
}

pub(crate) async fn create_offer_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Json(input): Json<OfferInput>,
) -> ActionResult<OfferView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let created = session
        .require_role(UserRole::Supplier)
        .and_then(|supplier_id| services.catalog.create_offer(supplier_id, &input));
    match created {
        Ok(offer) => ActionResult::created(OfferView::from(&offer)),
        Err(error) => error.into(),
    }
}

pub(crate) async fn get_offer_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Path(offer_id): Path<String>,
) -> ActionResult<OfferView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    services
        .catalog
        .get_offer(&session.user_id, &OfferId(offer_id))
        .map(|listing| OfferView::from(&listing))
        .into()
}

pub(crate) async fn update_offer_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Path(offer_id): Path<String>,
    Json(fields): Json<OfferInput>,
) -> ActionResult<OfferView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let input = OfferUpdateInput {
        id: offer_id,
        fields,
    };
    session
        .require_role(UserRole::Supplier)
        .and_then(|supplier_id| services.catalog.update_offer(supplier_id, &input))
        .map(|offer| OfferView::from(&offer))
        .into()
}

pub(crate) async fn delete_offer_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Path(offer_id): Path<String>,
) -> ActionResult<OfferView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    session
        .require_role(UserRole::Supplier)
        .and_then(|supplier_id| {
            services
                .catalog
                .delete_offer(supplier_id, &OfferId(offer_id))
        })
        .map(|offer| OfferView::from(&offer))
        .into()
}

pub(crate) async fn supplier_offers_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Query(filter): Query<SupplierOfferFilter>,
) -> ActionResult<Vec<OfferView>>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    session
        .require_role(UserRole::Supplier)
        .and_then(|supplier_id| services.catalog.list_supplier_offers(supplier_id, &filter))
        .map(|offers| offers.iter().map(OfferView::from).collect::<Vec<_>>())
        .into()
}

#[derive(Debug, Default, Deserialize)]
pub struct PhotoUploadParams {
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct PhotoDeleteInput {
    pub url: String,
}

pub(crate) async fn upload_photo_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Query(params): Query<PhotoUploadParams>,
    body: Bytes,
) -> ActionResult<StoredPhoto>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let uploaded = session.require_role(UserRole::Supplier).and_then(|owner| {
        services
            .photos
            .upload(owner, &params.file_name, &body)
            .map_err(MarketplaceError::from)
    });
    match uploaded {
        Ok(photo) => ActionResult::created(photo),
        Err(error) => error.into(),
    }
}

pub(crate) async fn delete_photo_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Json(input): Json<PhotoDeleteInput>,
) -> ActionResult<Value>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    session
        .require_role(UserRole::Supplier)
        .and_then(|owner| {
            services
                .photos
                .delete_owned(owner, &input.url)
                .map_err(MarketplaceError::from)
        })
        .map(|()| json!({ "url": input.url }))
        .into()
}

pub(crate) async fn serve_photo_handler<S, O>(
    State(services): Services<S, O>,
    Path(path): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    match services.photos.fetch(&path) {
        Ok(object) => (
            [(header::CONTENT_TYPE, object.content_type.to_string())],
            object.bytes,
        )
            .into_response(),
        Err(error) => ActionResult::<()>::from(MarketplaceError::from(error)).into_response(),
    }
}

pub(crate) async fn create_request_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Json(input): Json<RequestInput>,
) -> ActionResult<RequestView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let created = session.require_role(UserRole::Store).and_then(|store_id| {
        let draft = validate_request_input(&input)?;
        services.requests.create_request(store_id, draft)
    });
    match created {
        Ok(request) => ActionResult::created(RequestView::from(&request)),
        Err(error) => error.into(),
    }
}

/// Stores see the requests they sent, suppliers the ones they received.
pub(crate) async fn list_requests_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Query(filter): Query<RequestFilter>,
) -> ActionResult<Vec<RequestView>>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let listings = match session.role {
        UserRole::Store => services
            .requests
            .list_store_requests(&session.user_id, &filter),
        UserRole::Supplier => services
            .requests
            .list_supplier_requests(&session.user_id, &filter),
    };
    listings
        .map(|listings| listings.iter().map(RequestView::from).collect::<Vec<_>>())
        .into()
}

pub(crate) async fn treat_request_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Path(request_id): Path<String>,
) -> ActionResult<RequestView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    session
        .require_role(UserRole::Supplier)
        .and_then(|supplier_id| {
            services
                .requests
                .mark_request_treated(&RequestId(request_id), supplier_id)
        })
        .map(|request| RequestView::from(&request))
        .into()
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub(crate) async fn list_notifications_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Query(params): Query<FeedParams>,
) -> ActionResult<FeedPageView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let limit = params.limit.map(|limit| limit.clamp(1, MAX_PAGE_SIZE));
    services
        .feed
        .list(&session.user_id, session.role, params.offset, limit)
        .map(|page| FeedPageView::from(&page))
        .into()
}

pub(crate) async fn unread_count_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
) -> ActionResult<Value>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    services
        .feed
        .count_unread(&session.user_id, session.role)
        .map(|count| json!({ "count": count }))
        .into()
}

pub(crate) async fn mark_read_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
    Path(notification_id): Path<String>,
) -> ActionResult<NotificationView>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    services
        .feed
        .mark_read(&NotificationId(notification_id), &session.user_id)
        .map(|notification| NotificationView::from(&notification))
        .into()
}

pub(crate) async fn mark_all_read_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
) -> ActionResult<Value>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    services
        .feed
        .mark_all_read(&session.user_id, session.role)
        .map(|updated| json!({ "updated": updated }))
        .into()
}

pub(crate) async fn notification_stream_handler<S, O>(
    State(services): Services<S, O>,
    session: Session,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: MarketplaceStore + 'static,
    O: ObjectStore + 'static,
{
    let stream = services
        .hub
        .subscribe(session.user_id)
        .into_stream()
        .filter_map(|notification| {
            let view = NotificationView::from(&notification);
            serde_json::to_string(&view).ok().map(|data| {
                Ok::<_, Infallible>(
                    Event::default()
                        .event("notification")
                        .id(view.id)
                        .data(data),
                )
            })
        });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
