use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::domain::{Request, RequestDraft, RequestId, RequestStatus};
use crate::marketplace::accounts::UserId;
use crate::marketplace::calendar::Period;
use crate::marketplace::clock::Clock;
use crate::marketplace::context::OperationContext;
use crate::marketplace::error::MarketplaceError;
use crate::marketplace::notifications::{Notification, NotificationEvent, NotificationHub};
use crate::marketplace::store::{MarketplaceStore, RepositoryError, WriteBatch};

/// Request row with the offer name joined in for list views.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestListing {
    pub request: Request,
    pub offer_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RequestFilter {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    /// Keeps requests created inside the current week or month.
    #[serde(default)]
    pub period: Option<Period>,
}

/// Drives the PENDING → TREATED lifecycle and the notification each step emits.
pub struct RequestWorkflow<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    hub: NotificationHub,
}

impl<S> RequestWorkflow<S>
where
    S: MarketplaceStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, hub: NotificationHub) -> Self {
        Self { store, clock, hub }
    }

    /// Record a store's request against an available offer and notify the offer's supplier.
    pub fn create_request(
        &self,
        store_id: &UserId,
        draft: RequestDraft,
    ) -> Result<Request, MarketplaceError> {
        let now = self.clock.now();
        let context = OperationContext::new(self.store.as_ref());
        let offer = context
            .offer(&draft.offer_id)?
            .filter(|offer| offer.is_available_on(now.date_naive()))
            .ok_or(MarketplaceError::NotFound("offer"))?;

        let request = Request {
            id: RequestId::generate(),
            store_id: store_id.clone(),
            offer_id: offer.id.clone(),
            supplier_id: offer.supplier_id.clone(),
            request_type: draft.request_type,
            status: RequestStatus::Pending,
            message: draft.message,
            created_at: now,
            updated_at: now,
        };
        let notification = NotificationEvent::NewRequest {
            request: request.clone(),
            offer_name: offer.name,
            store_name: context.display_name(store_id)?,
        }
        .into_notification(now);

        let batch = WriteBatch::new()
            .require_available_offer(request.offer_id.clone(), now.date_naive())
            .insert_request(request.clone())
            .insert_notification(notification.clone());
        match self.store.commit(batch) {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(MarketplaceError::NotFound("offer")),
            Err(other) => return Err(other.into()),
        }
        info!(
            request_id = %request.id,
            offer_id = %request.offer_id,
            store_id = %store_id,
            supplier_id = %request.supplier_id,
            "request created"
        );
        self.publish(notification);
        Ok(request)
    }

    /// Close a pending request. Only the supplier it was addressed to may do so, and only once.
    pub fn mark_request_treated(
        &self,
        request_id: &RequestId,
        acting_supplier_id: &UserId,
    ) -> Result<Request, MarketplaceError> {
        let request = self
            .store
            .fetch_request(request_id)?
            .ok_or(MarketplaceError::NotFound("request"))?;
        if &request.supplier_id != acting_supplier_id {
            return Err(MarketplaceError::forbidden(
                "only the receiving supplier can treat this request",
            ));
        }
        if !request.status.can_transition_to(RequestStatus::Treated) {
            return Err(already_treated());
        }

        let now = self.clock.now();
        let context = OperationContext::new(self.store.as_ref());
        let offer_name = context
            .offer(&request.offer_id)?
            .map(|offer| offer.name)
            .unwrap_or_else(|| request.offer_id.0.clone());
        let treated = Request {
            status: RequestStatus::Treated,
            updated_at: now,
            ..request
        };
        let notification = NotificationEvent::RequestTreated {
            request: treated.clone(),
            offer_name,
            supplier_name: context.display_name(acting_supplier_id)?,
        }
        .into_notification(now);

        let batch = WriteBatch::new()
            .transition_request(
                treated.id.clone(),
                RequestStatus::Pending,
                RequestStatus::Treated,
                now,
            )
            .insert_notification(notification.clone());
        match self.store.commit(batch) {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => return Err(already_treated()),
            Err(other) => return Err(other.into()),
        }
        info!(
            request_id = %treated.id,
            supplier_id = %acting_supplier_id,
            store_id = %treated.store_id,
            "request treated"
        );
        self.publish(notification);
        Ok(treated)
    }

    /// Requests a store has sent, newest first.
    pub fn list_store_requests(
        &self,
        store_id: &UserId,
        filter: &RequestFilter,
    ) -> Result<Vec<RequestListing>, MarketplaceError> {
        let requests = self.store.store_requests(store_id)?;
        self.listings(requests, filter)
    }

    /// Requests a supplier has received, newest first.
    pub fn list_supplier_requests(
        &self,
        supplier_id: &UserId,
        filter: &RequestFilter,
    ) -> Result<Vec<RequestListing>, MarketplaceError> {
        let requests = self.store.supplier_requests(supplier_id)?;
        self.listings(requests, filter)
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    fn listings(
        &self,
        requests: Vec<Request>,
        filter: &RequestFilter,
    ) -> Result<Vec<RequestListing>, MarketplaceError> {
        let window = filter.period.map(|period| period.range_at(self.clock.now()));
        let context = OperationContext::new(self.store.as_ref());
        requests
            .into_iter()
            .filter(|request| filter.status.map_or(true, |status| request.status == status))
            .filter(|request| window.map_or(true, |window| window.contains(request.created_at)))
            .map(|request| {
                let offer_name = context
                    .offer(&request.offer_id)?
                    .map(|offer| offer.name)
                    .unwrap_or_else(|| request.offer_id.0.clone());
                Ok::<_, MarketplaceError>(RequestListing {
                    request,
                    offer_name,
                })
            })
            .collect()
    }

    fn publish(&self, notification: Notification) {
        self.hub.publish(notification);
    }
}

fn already_treated() -> MarketplaceError {
    MarketplaceError::conflict("request has already been treated")
}
