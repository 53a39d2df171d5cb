use carpool_core::CoreError;
use thiserror::Error;

/// Errors returned by the Nominatim geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A result carried `lat`/`lon` values that are not valid coordinates.
    #[error("invalid coordinate in response: {0}")]
    InvalidCoordinate(#[from] CoreError),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Free-text suggestion queries must carry a minimum amount of text.
    #[error("query must be at least {min} characters")]
    QueryTooShort { min: usize },
}
