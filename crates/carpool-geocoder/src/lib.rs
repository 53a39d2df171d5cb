//! Nominatim geocoding client for the carpool board.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{GeocoderConfig, NominatimClient, MIN_SUGGEST_QUERY_CHARS};
pub use error::GeocodeError;
pub use retry::{GeocodeOutcome, RetryPolicy, Sleeper, TokioSleeper};
pub use types::{AddressSuggestion, NominatimAddress, NominatimPlace};
