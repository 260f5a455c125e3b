//! Request extractors whose rejections use the marketplace error envelope instead of axum's
//! plain-text bodies.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use super::error::MarketplaceError;
use super::validation::ValidationError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(MarketplaceError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(MarketplaceError))]
pub struct Query<T>(pub T);

impl From<JsonRejection> for MarketplaceError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::single("body", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for MarketplaceError {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::single("query", rejection.body_text()).into()
    }
}
