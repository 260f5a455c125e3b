use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::storage::StorageError;
use super::store::RepositoryError;
use super::validation::{FieldError, ValidationError};

/// Machine-readable failure category carried in every error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "FORBIDDEN")]
    Forbidden,
    #[serde(rename = "CONFLICT")]
    Conflict,
    #[serde(rename = "SERVER_ERROR")]
    Server,
}

impl ErrorCode {
    pub const fn code(self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Server => "SERVER_ERROR",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure of a marketplace operation.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("store error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("photo storage error: {0}")]
    Storage(#[from] StorageError),
}

impl MarketplaceError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            MarketplaceError::Validation(_) => ErrorCode::Validation,
            MarketplaceError::NotFound(_) => ErrorCode::NotFound,
            MarketplaceError::Unauthorized(_) => ErrorCode::Unauthorized,
            MarketplaceError::Forbidden(_) => ErrorCode::Forbidden,
            MarketplaceError::Conflict(_) => ErrorCode::Conflict,
            MarketplaceError::Repository(RepositoryError::Conflict) => ErrorCode::Conflict,
            MarketplaceError::Repository(RepositoryError::NotFound) => ErrorCode::NotFound,
            MarketplaceError::Repository(RepositoryError::Unavailable(_)) => ErrorCode::Server,
            MarketplaceError::Storage(error) => error.code(),
        }
    }

    pub fn fields(&self) -> &[FieldError] {
        match self {
            MarketplaceError::Validation(error) => &error.fields,
            _ => &[],
        }
    }

    /// Failure body in the shape clients consume.
    pub fn failure(&self) -> ActionFailure {
        let code = self.code();
        let error = match code {
            ErrorCode::Server => "Something went wrong. Please try again.".to_string(),
            _ => self.to_string(),
        };
        ActionFailure {
            error,
            code,
            fields: self.fields().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    pub error: String,
    pub code: ErrorCode,
    pub fields: Vec<FieldError>,
}

/// Tagged envelope returned by every marketplace endpoint.
#[derive(Debug)]
pub enum ActionResult<T> {
    Success { status: StatusCode, data: T },
    Failure(MarketplaceError),
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self::Success {
            status: StatusCode::OK,
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self::Success {
            status: StatusCode::CREATED,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            ActionResult::Success { status, data } => ActionResult::Success {
                status,
                data: f(data),
            },
            ActionResult::Failure(error) => ActionResult::Failure(error),
        }
    }
}

impl<T> From<Result<T, MarketplaceError>> for ActionResult<T> {
    fn from(result: Result<T, MarketplaceError>) -> Self {
        match result {
            Ok(data) => ActionResult::ok(data),
            Err(error) => ActionResult::Failure(error),
        }
    }
}

impl<T> From<MarketplaceError> for ActionResult<T> {
    fn from(error: MarketplaceError) -> Self {
        ActionResult::Failure(error)
    }
}

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        ActionResult::<()>::Failure(self).into_response()
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        match self {
            ActionResult::Success { status, data } => {
                let body = json!({ "success": true, "data": data });
                (status, Json(body)).into_response()
            }
            ActionResult::Failure(error) => {
                let code = error.code();
                if code == ErrorCode::Server {
                    warn!(error = %error, "marketplace operation failed");
                }
                let failure = error.failure();
                let body = json!({
                    "success": false,
                    "error": failure.error,
                    "code": failure.code,
                    "fields": failure.fields,
                });
                (code.status(), Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_failures_map_to_codes() {
        assert_eq!(
            MarketplaceError::from(RepositoryError::Conflict).code(),
            ErrorCode::Conflict
        );
        assert_eq!(
            MarketplaceError::from(RepositoryError::Unavailable("down".into())).code(),
            ErrorCode::Server
        );
    }

    #[test]
    fn server_failures_hide_internal_detail() {
        let failure =
            MarketplaceError::from(RepositoryError::Unavailable("pool exhausted".into())).failure();
        assert_eq!(failure.code, ErrorCode::Server);
        assert!(!failure.error.contains("pool exhausted"));
    }

    #[test]
    fn validation_failure_lists_fields() {
        let failure = MarketplaceError::from(ValidationError::single("name", "is required"))
            .failure();
        assert_eq!(failure.code, ErrorCode::Validation);
        assert_eq!(failure.fields.len(), 1);
        assert_eq!(
            serde_json::to_value(failure.code).expect("serializes"),
            json!("VALIDATION_ERROR")
        );
    }

    #[tokio::test]
    async fn envelope_carries_status_and_flag() {
        let response =
            ActionResult::<()>::from(MarketplaceError::forbidden("not your offer")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("FORBIDDEN"));
        assert_eq!(body["error"], json!("not your offer"));

        let response = ActionResult::created(json!({"id": "x"})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
