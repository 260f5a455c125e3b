use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::marketplace::accounts::{UserId, UserRole};
use crate::marketplace::requests::domain::Request;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewRequest,
    RequestTreated,
}

impl NotificationKind {
    pub const fn code(self) -> &'static str {
        match self {
            NotificationKind::NewRequest => "NEW_REQUEST",
            NotificationKind::RequestTreated => "REQUEST_TREATED",
        }
    }
}

/// Inbox entry for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub user_type: UserRole,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Request the notification is about.
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_addressed_to(&self, user_id: &UserId, user_type: UserRole) -> bool {
        &self.user_id == user_id && self.user_type == user_type
    }
}

/// Request lifecycle events that produce exactly one notification each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A store asked about an offer; the offer's supplier hears about it.
    NewRequest {
        request: Request,
        offer_name: String,
        store_name: String,
    },
    /// The supplier handled the request; the requesting store hears about it.
    RequestTreated {
        request: Request,
        offer_name: String,
        supplier_name: String,
    },
}

impl NotificationEvent {
    pub fn request(&self) -> &Request {
        match self {
            NotificationEvent::NewRequest { request, .. }
            | NotificationEvent::RequestTreated { request, .. } => request,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationEvent::NewRequest { .. } => NotificationKind::NewRequest,
            NotificationEvent::RequestTreated { .. } => NotificationKind::RequestTreated,
        }
    }

    pub fn recipient(&self) -> (&UserId, UserRole) {
        match self {
            NotificationEvent::NewRequest { request, .. } => {
                (&request.supplier_id, UserRole::Supplier)
            }
            NotificationEvent::RequestTreated { request, .. } => {
                (&request.store_id, UserRole::Store)
            }
        }
    }

    pub fn title(&self) -> String {
        match self {
            NotificationEvent::NewRequest { request, .. } => {
                format!("New {}", request.request_type.label())
            }
            NotificationEvent::RequestTreated { .. } => "Your request was treated".to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            NotificationEvent::NewRequest {
                request,
                offer_name,
                store_name,
            } => format!(
                "{store_name} sent an {} about \"{offer_name}\".",
                request.request_type.label()
            ),
            NotificationEvent::RequestTreated {
                request,
                offer_name,
                supplier_name,
            } => format!(
                "{supplier_name} treated your {} about \"{offer_name}\".",
                request.request_type.label()
            ),
        }
    }

    pub fn into_notification(self, at: DateTime<Utc>) -> Notification {
        let (user_id, user_type) = self.recipient();
        Notification {
            id: NotificationId::generate(),
            user_id: user_id.clone(),
            user_type,
            kind: self.kind(),
            title: self.title(),
            body: self.body(),
            related_id: Some(self.request().id.0.clone()),
            read: false,
            created_at: at,
            updated_at: at,
        }
    }
}
