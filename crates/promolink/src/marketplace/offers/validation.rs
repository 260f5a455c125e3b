use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{OfferCategory, OfferId, OfferStatus};
use crate::marketplace::validation::{
    optional_text, parse_date_input, Decimal2, DecimalError, FieldErrors, NumberInput,
    ValidationError,
};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 255;
pub const SUBCATEGORY_MAX_CHARS: usize = 100;
pub const FREE_TEXT_MAX_CHARS: usize = 1000;
pub const DISCOUNT_RANGE: std::ops::RangeInclusive<i64> = 1..=99;
pub const MARGIN_MIN: Decimal2 = Decimal2::from_hundredths(1);
pub const MARGIN_MAX: Decimal2 = Decimal2::from_hundredths(9_999);

/// Offer form payload as submitted by a supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<NumberInput>,
    #[serde(default)]
    pub discount_percent: Option<NumberInput>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub margin_percent: Option<NumberInput>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Edit payload: the same form plus the identifier of the offer being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferUpdateInput {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub fields: OfferInput,
}

/// Typed, validated offer attributes ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferFields {
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
}

/// Validate a new offer; the start date may not lie before `today` (UTC).
pub fn validate_offer_create(
    input: &OfferInput,
    today: NaiveDate,
) -> Result<OfferFields, ValidationError> {
    validate_fields(input, Some(today), FieldErrors::new())
}

/// Validate an edit. A start date in the past is allowed so running offers stay editable.
pub fn validate_offer_update(
    input: &OfferUpdateInput,
) -> Result<(OfferId, OfferFields), ValidationError> {
    let mut errors = FieldErrors::new();
    let id = errors.check("id", parse_offer_id(&input.id));
    let fields = validate_fields(&input.fields, None, errors)?;
    match id {
        Some(id) => Ok((id, fields)),
        None => Err(ValidationError::single("id", "is required")),
    }
}

pub fn parse_offer_id(raw: &str) -> Result<OfferId, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("is required".to_string());
    }
    uuid::Uuid::parse_str(trimmed)
        .map(|id| OfferId(id.to_string()))
        .map_err(|_| "must be a valid identifier".to_string())
}

fn validate_fields(
    input: &OfferInput,
    earliest_start: Option<NaiveDate>,
    mut errors: FieldErrors,
) -> Result<OfferFields, ValidationError> {
    let name = errors.check("name", check_name(&input.name));
    let price = errors.check("price", check_price(input.price.as_ref()));
    let discount_percent = errors.check(
        "discount_percent",
        check_discount(input.discount_percent.as_ref()),
    );
    let category = errors.check("category", check_category(&input.category));
    let start_date = errors.check(
        "start_date",
        parse_date_input(&input.start_date).and_then(|date| match earliest_start {
            Some(today) if date < today => Err("must be today or later".to_string()),
            _ => Ok(date),
        }),
    );
    let end_date = errors.check("end_date", parse_date_input(&input.end_date));
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            errors.push("end_date", "must be on or after the start date");
        }
    }

    let subcategory = errors.check(
        "subcategory",
        optional_text(input.subcategory.as_deref(), SUBCATEGORY_MAX_CHARS),
    );
    let margin_percent = errors.check(
        "margin_percent",
        check_margin(input.margin_percent.as_ref()),
    );
    let volume = errors.check(
        "volume",
        optional_text(input.volume.as_deref(), FREE_TEXT_MAX_CHARS),
    );
    let conditions = errors.check(
        "conditions",
        optional_text(input.conditions.as_deref(), FREE_TEXT_MAX_CHARS),
    );
    let animation = errors.check(
        "animation",
        optional_text(input.animation.as_deref(), FREE_TEXT_MAX_CHARS),
    );
    let photo_url = errors.check(
        "photo_url",
        optional_text(input.photo_url.as_deref(), FREE_TEXT_MAX_CHARS * 2),
    );
    let status = errors.check("status", check_status(input.status.as_deref()));

    errors.finish()?;

    match (
        name,
        price,
        discount_percent,
        start_date,
        end_date,
        category,
        subcategory,
        margin_percent,
        volume,
        conditions,
        animation,
        photo_url,
        status,
    ) {
        (
            Some(name),
            Some(price),
            Some(discount_percent),
            Some(start_date),
            Some(end_date),
            Some(category),
            Some(subcategory),
            Some(margin_percent),
            Some(volume),
            Some(conditions),
            Some(animation),
            Some(photo_url),
            Some(status),
        ) => Ok(OfferFields {
            name,
            price,
            discount_percent,
            start_date,
            end_date,
            category,
            subcategory,
            margin_percent,
            volume,
            conditions,
            animation,
            photo_url,
            status,
        }),
        _ => Err(ValidationError::single("offer", "is incomplete")),
    }
}

fn check_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    let length = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return Err(format!(
            "must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        ));
    }
    Ok(name.to_string())
}

fn check_price(raw: Option<&NumberInput>) -> Result<Decimal2, String> {
    let raw = raw.ok_or_else(|| "is required".to_string())?;
    let price = Decimal2::parse(&raw.as_text()).map_err(|err| match err {
        DecimalError::TooPrecise => "must have at most 2 decimal places".to_string(),
        DecimalError::Malformed => "must be a number".to_string(),
        DecimalError::Overflow => "is too large".to_string(),
    })?;
    if price.hundredths() <= 0 {
        return Err("must be greater than 0".to_string());
    }
    Ok(price)
}

fn check_discount(raw: Option<&NumberInput>) -> Result<u8, String> {
    let raw = raw.ok_or_else(|| "is required".to_string())?;
    let value = match Decimal2::parse(&raw.as_text()) {
        Ok(value) if value.is_whole() => value.hundredths() / 100,
        Ok(_) | Err(DecimalError::TooPrecise) => {
            return Err("must be a whole number".to_string())
        }
        Err(_) => return Err("must be a number".to_string()),
    };
    if !DISCOUNT_RANGE.contains(&value) {
        return Err(format!(
            "must be between {} and {}",
            DISCOUNT_RANGE.start(),
            DISCOUNT_RANGE.end()
        ));
    }
    u8::try_from(value).map_err(|_| "is out of range".to_string())
}

fn check_category(raw: &str) -> Result<OfferCategory, String> {
    OfferCategory::from_code(raw).ok_or_else(|| {
        let allowed = OfferCategory::ordered()
            .iter()
            .map(|category| category.code())
            .collect::<Vec<_>>()
            .join(", ");
        format!("must be one of {allowed}")
    })
}

fn check_margin(raw: Option<&NumberInput>) -> Result<Option<Decimal2>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let text = raw.as_text();
    if text.is_empty() {
        return Ok(None);
    }
    let margin = Decimal2::parse(&text).map_err(|err| match err {
        DecimalError::TooPrecise => "must have at most 2 decimal places".to_string(),
        DecimalError::Malformed | DecimalError::Overflow => "must be a number".to_string(),
    })?;
    if margin < MARGIN_MIN || margin > MARGIN_MAX {
        return Err(format!("must be between {MARGIN_MIN} and {MARGIN_MAX}"));
    }
    Ok(Some(margin))
}

fn check_status(raw: Option<&str>) -> Result<OfferStatus, String> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(OfferStatus::Draft),
        Some(value) if value.eq_ignore_ascii_case("DRAFT") => Ok(OfferStatus::Draft),
        Some(value) if value.eq_ignore_ascii_case("ACTIVE") => Ok(OfferStatus::Active),
        Some(_) => Err("must be DRAFT or ACTIVE".to_string()),
    }
}
