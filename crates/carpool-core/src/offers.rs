//! Ride offers and the address they are posted for.

use std::sync::LazyLock;

use chrono::{DateTime, Months, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::validation::{max_chars, optional, required, ValidationErrors};

pub const ZIP_CODE_MAX_CHARS: usize = 10;
pub const TEXT_MAX_CHARS: usize = 255;

/// Months an offer stays valid when the poster gives no end date.
pub const DEFAULT_VALIDITY_MONTHS: u32 = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Postal address of an offer or a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub zip_code: String,
    pub city: String,
    pub street: Option<String>,
}

impl Address {
    #[must_use]
    pub fn new(zip_code: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            zip_code: zip_code.into(),
            city: city.into(),
            street: None,
        }
    }

    #[must_use]
    pub fn with_street(mut self, street: Option<String>) -> Self {
        self.street = street;
        self
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.street {
            Some(street) => write!(f, "{street}, {} {}", self.zip_code, self.city),
            None => write!(f, "{} {}", self.zip_code, self.city),
        }
    }
}

/// Raw offer form as submitted by a client. Every field is optional here;
/// [`OfferFields::validate`] decides what is acceptable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferInput {
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub phone: Option<String>,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    pub cost_info: Option<String>,
    pub additional_info: Option<String>,
}

/// The writable part of an offer after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferFields {
    pub zip_code: String,
    pub city: String,
    pub street: Option<String>,
    pub last_name: String,
    pub first_name: Option<String>,
    pub email: String,
    pub class_name: Option<String>,
    pub phone: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub cost_info: Option<String>,
    pub additional_info: Option<String>,
}

impl OfferFields {
    /// Validates a submitted offer form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every rejected field.
    pub fn validate(input: &OfferInput) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let zip_code = required(&mut errors, "zip_code", input.zip_code.as_deref().unwrap_or(""));
        max_chars(&mut errors, "zip_code", zip_code, ZIP_CODE_MAX_CHARS);
        let city = required(&mut errors, "city", input.city.as_deref().unwrap_or(""));
        max_chars(&mut errors, "city", city, TEXT_MAX_CHARS);
        let last_name =
            required(&mut errors, "last_name", input.last_name.as_deref().unwrap_or(""));
        max_chars(&mut errors, "last_name", last_name, TEXT_MAX_CHARS);

        let email = required(&mut errors, "email", input.email.as_deref().unwrap_or(""));
        max_chars(&mut errors, "email", email, TEXT_MAX_CHARS);
        if !email.is_empty() && !EMAIL_RE.is_match(email) {
            errors.add("email", "The email field must be a valid email address.");
        }

        let street = optional(input.street.as_deref());
        let first_name = optional(input.first_name.as_deref());
        let class_name = optional(input.class_name.as_deref());
        let phone = optional(input.phone.as_deref());
        for (field, value) in [
            ("street", &street),
            ("first_name", &first_name),
            ("class", &class_name),
            ("phone", &phone),
        ] {
            if let Some(v) = value {
                max_chars(&mut errors, field, v, TEXT_MAX_CHARS);
            }
        }

        let valid_from = parse_date(&mut errors, "valid_from", input.valid_from.as_deref());
        let valid_until = parse_date(&mut errors, "valid_until", input.valid_until.as_deref());
        if let (Some(from), Some(until)) = (valid_from, valid_until) {
            if until < from {
                errors.add(
                    "valid_until",
                    "The valid until field must be a date after or equal to valid from.",
                );
            }
        }

        let fields = Self {
            zip_code: zip_code.to_string(),
            city: city.to_string(),
            street,
            last_name: last_name.to_string(),
            first_name,
            email: email.to_string(),
            class_name,
            phone,
            valid_from,
            valid_until,
            cost_info: optional(input.cost_info.as_deref()),
            additional_info: optional(input.additional_info.as_deref()),
        };
        errors.into_result(fields)
    }

    #[must_use]
    pub fn address(&self) -> Address {
        Address::new(self.zip_code.clone(), self.city.clone()).with_street(self.street.clone())
    }

    /// Resolves the validity window, filling gaps the way new offers default:
    /// from today, until six months from today.
    #[must_use]
    pub fn validity_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = self.valid_from.unwrap_or(today);
        let until = self.valid_until.unwrap_or_else(|| {
            today
                .checked_add_months(Months::new(DEFAULT_VALIDITY_MONTHS))
                .unwrap_or(NaiveDate::MAX)
        });
        (from, until)
    }
}

fn parse_date(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(
                field,
                format!("The {} field must be a valid date.", field.replace('_', " ")),
            );
            None
        }
    }
}

/// A stored ride offer.
///
/// `coordinates` is either fully present or absent; a half-set pair cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub id: i64,
    pub zip_code: String,
    pub city: String,
    pub street: Option<String>,
    pub last_name: String,
    pub first_name: Option<String>,
    pub email: String,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub phone: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub cost_info: Option<String>,
    pub additional_info: Option<String>,
    #[serde(flatten)]
    pub coordinates: Option<Coordinate>,
    #[serde(skip_serializing)]
    pub edit_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    #[must_use]
    pub fn address(&self) -> Address {
        Address::new(self.zip_code.clone(), self.city.clone()).with_street(self.street.clone())
    }

    /// Whether `fields` would move this offer to a different address.
    #[must_use]
    pub fn address_differs(&self, fields: &OfferFields) -> bool {
        self.zip_code != fields.zip_code || self.city != fields.city || self.street != fields.street
    }
}
