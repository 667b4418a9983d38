//! # Listing Validation
//!
//! Field rules applied to a candidate listing before anything is uploaded or
//! written. Every violated rule is reported so the poster can fix them all
//! in one go.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::VehicleType;

pub const MIN_YEAR: i32 = 1900;

/// North-American style: `(555) 123-4567`, `555.123.4567`, `5551234567`, ...
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?(\d{3})\)?[-.\s]?(\d{3})[-.\s]?(\d{4})$").expect("Invalid regex")
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

/// A listing as submitted by the post-an-ad form. Everything is optional
/// because the form may be sent half filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `car` or `motorcycle`.
    pub vehicle_type: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "lenient_number")]
    pub mileage: Option<i64>,
    #[serde(deserialize_with = "lenient_number")]
    pub price: Option<Decimal>,
    pub condition: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub color: Option<String>,
    pub location: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Forms send blank or half-typed numeric inputs as text. Anything that does
/// not read as a number becomes `None` and is reported by the validator.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + std::str::FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Number(T),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Number(value)) => Some(value),
        Some(Lenient::Text(text)) => text.trim().parse().ok(),
        Some(Lenient::Other(_)) | None => None,
    })
}

/// Outcome of [`validate_listing`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Validates against the current calendar year.
pub fn validate_listing(draft: &ListingDraft) -> ValidationReport {
    validate_listing_at(draft, Utc::now().year())
}

/// Validates a draft, accepting model years up to `current_year + 1`.
pub fn validate_listing_at(draft: &ListingDraft, current_year: i32) -> ValidationReport {
    let mut errors = Vec::new();
    let mut check = |ok: bool, message: &str| {
        if !ok {
            errors.push(message.to_string());
        }
    };

    check(
        min_trimmed(&draft.title, 10),
        "Title must be at least 10 characters long",
    );
    check(
        min_trimmed(&draft.description, 50),
        "Description must be at least 50 characters long",
    );
    check(
        draft
            .vehicle_type
            .as_deref()
            .is_some_and(|t| t.trim().parse::<VehicleType>().is_ok()),
        "Vehicle type is required",
    );
    check(min_trimmed(&draft.brand, 2), "Brand is required");
    check(min_trimmed(&draft.model, 2), "Model is required");
    check(
        draft
            .year
            .is_some_and(|y| (MIN_YEAR..=current_year + 1).contains(&y)),
        "Please enter a valid year",
    );
    check(
        draft.mileage.is_some_and(|m| m >= 0),
        "Please enter a valid mileage",
    );
    check(
        draft.price.is_some_and(|p| p > Decimal::ZERO),
        "Please enter a valid price",
    );
    check(min_trimmed(&draft.condition, 1), "Vehicle condition is required");
    check(min_trimmed(&draft.location, 3), "Location is required");
    check(min_trimmed(&draft.contact_name, 2), "Contact name is required");
    check(
        draft.phone.as_deref().is_some_and(is_valid_phone),
        "Please enter a valid phone number",
    );
    check(
        draft.email.as_deref().is_some_and(is_valid_email),
        "Please enter a valid email address",
    );

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn min_trimmed(value: &Option<String>, min: usize) -> bool {
    value
        .as_deref()
        .is_some_and(|v| v.trim().chars().count() >= min)
}
