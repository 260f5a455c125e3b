use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::marketplace::accounts::UserId;
use crate::marketplace::calendar::DateRange;
use crate::marketplace::validation::Decimal2;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl OfferId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of shelf categories an offer can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferCategory {
    Epicerie,
    Frais,
    Dph,
    Surgeles,
    Boissons,
    Autres,
}

impl OfferCategory {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Epicerie,
            Self::Frais,
            Self::Dph,
            Self::Surgeles,
            Self::Boissons,
            Self::Autres,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Epicerie => "EPICERIE",
            Self::Frais => "FRAIS",
            Self::Dph => "DPH",
            Self::Surgeles => "SURGELES",
            Self::Boissons => "BOISSONS",
            Self::Autres => "AUTRES",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Epicerie => "Épicerie",
            Self::Frais => "Frais",
            Self::Dph => "DPH",
            Self::Surgeles => "Surgelés",
            Self::Boissons => "Boissons",
            Self::Autres => "Autres",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Draft,
    Active,
    Expired,
}

impl OfferStatus {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
        }
    }
}

/// Persisted promotional listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub supplier_id: UserId,
    pub name: String,
    pub price: Decimal2,
    pub discount_percent: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: OfferCategory,
    pub subcategory: Option<String>,
    pub margin_percent: Option<Decimal2>,
    pub volume: Option<String>,
    pub conditions: Option<String>,
    pub animation: Option<String>,
    pub photo_url: Option<String>,
    pub status: OfferStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Visible to stores: active, not soft-deleted, and not past its last day.
    pub fn is_available_on(&self, today: NaiveDate) -> bool {
        self.status == OfferStatus::Active && !self.is_deleted() && today <= self.end_date
    }

    /// Active offers whose last day is behind `today` are due for the expiry sweep.
    pub fn is_lapsed_on(&self, today: NaiveDate) -> bool {
        self.status == OfferStatus::Active && !self.is_deleted() && self.end_date < today
    }

    pub fn validity(&self) -> DateRange {
        DateRange::days(self.start_date, self.end_date)
    }

    pub fn is_owned_by(&self, supplier_id: &UserId) -> bool {
        &self.supplier_id == supplier_id
    }
}
