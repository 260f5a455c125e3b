//! Transport views: exact amounts become plain JSON numbers and every instant an ISO-8601 UTC
//! string with millisecond precision.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

use super::calendar::start_of_day;
use super::notifications::{FeedPage, Notification};
use super::offers::{Offer, OfferListing};
use super::requests::{Request, RequestListing};

pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar dates travel as midnight UTC.
pub fn iso_date(date: NaiveDate) -> String {
    iso_timestamp(start_of_day(date))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferView {
    pub id: String,
    pub supplier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    pub name: String,
    pub price: f64,
    pub discount_percent: u8,
    pub start_date: String,
    pub end_date: String,
    pub category: &'static str,
    pub category_label: &'static str,
    pub subcategory: Option<String>,
    pub margin_percent: Option<f64>,
    pub volume: Option<String>,
    pub conditions: Option<String>,
    pub animation: Option<String>,
    pub photo_url: Option<String>,
    pub status: &'static str,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Offer> for OfferView {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id.0.clone(),
            supplier_id: offer.supplier_id.0.clone(),
            supplier_name: None,
            name: offer.name.clone(),
            price: offer.price.to_f64(),
            discount_percent: offer.discount_percent,
            start_date: iso_date(offer.start_date),
            end_date: iso_date(offer.end_date),
            category: offer.category.code(),
            category_label: offer.category.label(),
            subcategory: offer.subcategory.clone(),
            margin_percent: offer.margin_percent.map(|margin| margin.to_f64()),
            volume: offer.volume.clone(),
            conditions: offer.conditions.clone(),
            animation: offer.animation.clone(),
            photo_url: offer.photo_url.clone(),
            status: offer.status.code(),
            deleted_at: offer.deleted_at.map(iso_timestamp),
            created_at: iso_timestamp(offer.created_at),
            updated_at: iso_timestamp(offer.updated_at),
        }
    }
}

impl From<&OfferListing> for OfferView {
    fn from(listing: &OfferListing) -> Self {
        Self {
            supplier_name: Some(listing.supplier_name.clone()),
            ..OfferView::from(&listing.offer)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestView {
    pub id: String,
    pub store_id: String,
    pub offer_id: String,
    pub supplier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_name: Option<String>,
    pub request_type: &'static str,
    pub status: &'static str,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Request> for RequestView {
    fn from(request: &Request) -> Self {
        Self {
            id: request.id.0.clone(),
            store_id: request.store_id.0.clone(),
            offer_id: request.offer_id.0.clone(),
            supplier_id: request.supplier_id.0.clone(),
            offer_name: None,
            request_type: request.request_type.code(),
            status: request.status.code(),
            message: request.message.clone(),
            created_at: iso_timestamp(request.created_at),
            updated_at: iso_timestamp(request.updated_at),
        }
    }
}

impl From<&RequestListing> for RequestView {
    fn from(listing: &RequestListing) -> Self {
        Self {
            offer_name: Some(listing.offer_name.clone()),
            ..RequestView::from(&listing.request)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub user_id: String,
    pub user_type: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Notification> for NotificationView {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.0.clone(),
            user_id: notification.user_id.0.clone(),
            user_type: notification.user_type.code(),
            kind: notification.kind.code(),
            title: notification.title.clone(),
            body: notification.body.clone(),
            related_id: notification.related_id.clone(),
            read: notification.read,
            created_at: iso_timestamp(notification.created_at),
            updated_at: iso_timestamp(notification.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedPageView {
    pub notifications: Vec<NotificationView>,
    pub has_more: bool,
}

impl From<&FeedPage> for FeedPageView {
    fn from(page: &FeedPage) -> Self {
        Self {
            notifications: page.notifications.iter().map(NotificationView::from).collect(),
            has_more: page.has_more,
        }
    }
}
