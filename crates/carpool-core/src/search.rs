//! Search query/result types and the textual fallback matcher.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::offers::{Address, Offer, TEXT_MAX_CHARS, ZIP_CODE_MAX_CHARS};
use crate::validation::{max_chars, required, ValidationErrors};

pub const DEFAULT_RADIUS_KM: i64 = 5;
pub const MIN_RADIUS_KM: i64 = 1;
pub const MAX_RADIUS_KM: i64 = 100;

/// A validated proximity search.
///
/// A radius of `0` means "no radius filter" and always takes the textual
/// fallback path. Callers cannot submit it through [`SearchQuery::new`];
/// internal tools build it with [`SearchQuery::without_radius`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    address: Address,
    radius_km: i64,
}

impl SearchQuery {
    /// Validates the search form: zip code and city are required, the radius
    /// defaults to 5 km and must lie in `[1, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] describing each rejected field.
    pub fn new(zip_code: &str, city: &str, radius_km: Option<i64>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let zip_code = required(&mut errors, "zip_code", zip_code);
        max_chars(&mut errors, "zip_code", zip_code, ZIP_CODE_MAX_CHARS);
        let city = required(&mut errors, "city", city);
        max_chars(&mut errors, "city", city, TEXT_MAX_CHARS);

        let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
            errors.add(
                "radius",
                format!("The radius field must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM}."),
            );
        }

        errors.into_result(Self {
            address: Address::new(zip_code, city),
            radius_km,
        })
    }

    /// A query that skips the distance filter and matches on text only.
    #[must_use]
    pub fn without_radius(address: Address) -> Self {
        Self {
            address,
            radius_km: 0,
        }
    }

    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    #[must_use]
    pub fn radius_km(&self) -> i64 {
        self.radius_km
    }
}

/// How a search result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Distance-ranked search around the geocoded query address.
    Radius,
    /// Zip/city text matching; geocoding failed or no radius was requested.
    Fallback,
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStrategy::Radius => write!(f, "radius"),
            SearchStrategy::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Nearest first for [`SearchStrategy::Radius`], store order otherwise.
    pub offers: Vec<Offer>,
    /// The geocoded query address, for centering a map.
    pub coordinates: Option<Coordinate>,
    pub strategy: SearchStrategy,
}

/// Textual match used when radius search is unavailable.
///
/// Deliberately permissive: an offer matches when its zip code equals the
/// query's and its city contains the query city, or its zip code equals the
/// query's, or its city starts with the query city. City comparisons ignore
/// case.
#[must_use]
pub fn fallback_matches(offer: &Offer, query: &Address) -> bool {
    let offer_city = offer.city.to_lowercase();
    let query_city = query.city.to_lowercase();
    let zip_equal = offer.zip_code == query.zip_code;

    (zip_equal && offer_city.contains(&query_city))
        || zip_equal
        || offer_city.starts_with(&query_city)
}
