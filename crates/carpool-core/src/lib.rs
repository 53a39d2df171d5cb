pub mod app_config;
pub mod config;
pub mod diagnostics;
pub mod distance;
pub mod geo;
pub mod geocode;
pub mod offers;
pub mod search;
pub mod store;
pub mod validation;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use distance::{distance_km, within_radius, Ranked, EARTH_RADIUS_KM};
pub use geo::Coordinate;
pub use geocode::Geocoder;
pub use offers::{Address, Offer, OfferFields};
pub use search::{
    fallback_matches, SearchQuery, SearchResult, SearchStrategy, DEFAULT_RADIUS_KM,
    MAX_RADIUS_KM, MIN_RADIUS_KM,
};
pub use store::OfferStore;
pub use validation::ValidationErrors;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("invalid {field} value '{raw}': not a decimal number")]
    InvalidDecimal { field: &'static str, raw: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
