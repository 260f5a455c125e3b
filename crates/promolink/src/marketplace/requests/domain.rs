use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::marketplace::accounts::UserId;
use crate::marketplace::offers::domain::OfferId;
use crate::marketplace::offers::validation::parse_offer_id;
use crate::marketplace::validation::{optional_text, FieldErrors, ValidationError};

pub const MESSAGE_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Info,
    Order,
}

impl RequestType {
    pub const fn code(self) -> &'static str {
        match self {
            RequestType::Info => "INFO",
            RequestType::Order => "ORDER",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RequestType::Info => "information request",
            RequestType::Order => "order request",
        }
    }
}

/// PENDING is initial, TREATED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Treated,
}

impl RequestStatus {
    pub const fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!((self, next), (RequestStatus::Pending, RequestStatus::Treated))
    }

    pub const fn code(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Treated => "TREATED",
        }
    }
}

/// A store's inquiry or order intent against one offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub store_id: UserId,
    pub offer_id: OfferId,
    /// Owner of the offer when the request was created.
    pub supplier_id: UserId,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request form as submitted by a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInput {
    #[serde(default)]
    pub offer_id: String,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validated request form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub offer_id: OfferId,
    pub request_type: RequestType,
    pub message: Option<String>,
}

impl RequestDraft {
    pub fn new(offer_id: OfferId, request_type: RequestType) -> Self {
        Self {
            offer_id,
            request_type,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub fn validate_request_input(input: &RequestInput) -> Result<RequestDraft, ValidationError> {
    let mut errors = FieldErrors::new();
    let offer_id = errors.check("offer_id", parse_offer_id(&input.offer_id));
    let request_type = errors.check(
        "request_type",
        match input.request_type.as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("INFO") => Ok(RequestType::Info),
            Some(value) if value.eq_ignore_ascii_case("ORDER") => Ok(RequestType::Order),
            Some(_) => Err("must be INFO or ORDER".to_string()),
            None => Err("is required".to_string()),
        },
    );
    let message = errors.check(
        "message",
        optional_text(input.message.as_deref(), MESSAGE_MAX_CHARS),
    );
    errors.finish()?;

    match (offer_id, request_type, message) {
        (Some(offer_id), Some(request_type), Some(message)) => Ok(RequestDraft {
            offer_id,
            request_type,
            message,
        }),
        _ => Err(ValidationError::single("request", "is incomplete")),
    }
}
