//! Shared building blocks for form validation: field-addressed errors and exact two-decimal
//! amounts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One rejected field with a message suitable for display next to the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field a payload got wrong. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid input: {}", summary(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summary(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| format!("{} {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.message_for(field).is_some()
    }
}

/// Accumulates field errors so a payload is reported in full rather than one field at a time.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record the error of `result` under `field`, returning the value when it was valid.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.push(field, message);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                fields: self.fields,
            })
        }
    }
}

/// Number coming from a form: either a JSON number or its textual rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumberInput {
    pub fn as_text(&self) -> String {
        match self {
            NumberInput::Number(number) => number.to_string(),
            NumberInput::Text(text) => text.trim().to_string(),
        }
    }
}

impl From<&str> for NumberInput {
    fn from(value: &str) -> Self {
        NumberInput::Text(value.to_string())
    }
}

impl From<i64> for NumberInput {
    fn from(value: i64) -> Self {
        NumberInput::Number(value.into())
    }
}

impl From<f64> for NumberInput {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(NumberInput::Number)
            .unwrap_or_else(|| NumberInput::Text(value.to_string()))
    }
}

/// Exact decimal amount with two fractional digits, held as hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Decimal2(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalError {
    Malformed,
    TooPrecise,
    Overflow,
}

impl Decimal2 {
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_whole(self) -> bool {
        self.0 % 100 == 0
    }

    /// Parse `123`, `123.4`, `123.45`, `-0.5`, or `1e2`-free decimal text.
    pub fn parse(raw: &str) -> Result<Self, DecimalError> {
        let trimmed = raw.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(DecimalError::Malformed);
        }
        if digits.ends_with('.') {
            return Err(DecimalError::Malformed);
        }

        let significant = fraction.trim_end_matches('0');
        if significant.len() > 2 {
            return Err(DecimalError::TooPrecise);
        }

        let units: i64 = whole.parse().map_err(|_| DecimalError::Overflow)?;
        let cents = match significant.len() {
            0 => 0,
            1 => significant.parse::<i64>().map_err(|_| DecimalError::Malformed)? * 10,
            _ => significant.parse::<i64>().map_err(|_| DecimalError::Malformed)?,
        };

        let magnitude = units
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .ok_or(DecimalError::Overflow)?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp; timestamps resolve to their UTC date.
pub fn parse_date_input(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("is required".to_string());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| instant.with_timezone(&Utc).date_naive())
        .map_err(|_| format!("'{trimmed}' is not a valid date (expected YYYY-MM-DD)"))
}

/// Trim an optional text field; blank values count as absent.
pub fn optional_text(value: Option<&str>, max_chars: usize) -> Result<Option<String>, String> {
    let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > max_chars {
        return Err(format!("must be at most {max_chars} characters"));
    }

    Ok(Some(text.to_string()))
}
