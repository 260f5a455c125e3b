use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::accounts::{UserId, UserRole};
use super::error::{ActionResult, MarketplaceError};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller identity as forwarded by the authentication gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, MarketplaceError> {
        let user_id = header_value(headers, USER_ID_HEADER)
            .ok_or_else(|| MarketplaceError::unauthorized("you must be signed in"))?;
        let role = header_value(headers, USER_ROLE_HEADER)
            .and_then(UserRole::from_code)
            .ok_or_else(|| MarketplaceError::unauthorized("unknown account role"))?;
        Ok(Self::new(user_id, role))
    }

    pub fn require_role(&self, role: UserRole) -> Result<&UserId, MarketplaceError> {
        if self.role == role {
            Ok(&self.user_id)
        } else {
            Err(MarketplaceError::forbidden(match role {
                UserRole::Supplier => "only suppliers can perform this action",
                UserRole::Store => "only stores can perform this action",
            }))
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[axum::async_trait]
impl<St> FromRequestParts<St> for Session
where
    St: Send + Sync,
{
    type Rejection = ActionResult<()>;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        Session::from_headers(&parts.headers).map_err(ActionResult::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::error::ErrorCode;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(*value));
        }
        headers
    }

    #[test]
    fn reads_identity_headers() {
        let session = Session::from_headers(&headers(&[
            (USER_ID_HEADER, "supplier-1"),
            (USER_ROLE_HEADER, "supplier"),
        ]))
        .expect("session");
        assert_eq!(session, Session::new("supplier-1", UserRole::Supplier));
        assert!(session.require_role(UserRole::Supplier).is_ok());
        let err = session.require_role(UserRole::Store).expect_err("wrong role");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn missing_or_unknown_headers_are_unauthorized() {
        for pairs in [
            vec![],
            vec![(USER_ID_HEADER, "store-1")],
            vec![(USER_ID_HEADER, "  "), (USER_ROLE_HEADER, "STORE")],
            vec![(USER_ID_HEADER, "store-1"), (USER_ROLE_HEADER, "ADMIN")],
        ] {
            let err = Session::from_headers(&headers(&pairs)).expect_err("rejected");
            assert_eq!(err.code(), ErrorCode::Unauthorized);
        }
    }
}
