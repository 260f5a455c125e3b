use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier issued by the identity provider for suppliers and stores alike.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the marketplace a user sits on. Doubles as a notification's recipient type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Supplier,
    Store,
}

impl UserRole {
    pub const fn code(self) -> &'static str {
        match self {
            UserRole::Supplier => "SUPPLIER",
            UserRole::Store => "STORE",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUPPLIER" => Some(UserRole::Supplier),
            "STORE" => Some(UserRole::Store),
            _ => None,
        }
    }
}

/// Public profile used to label offers and notification bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub role: UserRole,
    pub company_name: String,
}

impl Account {
    pub fn new(id: impl Into<String>, role: UserRole, company_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            role,
            company_name: company_name.into(),
        }
    }
}

/// Name shown to the counterpart; unknown accounts fall back to the raw identifier.
pub fn display_name(account: Option<&Account>, id: &UserId) -> String {
    account
        .map(|account| account.company_name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| id.0.clone())
}
