//! HTTP client for the Nominatim `/search` endpoint.
//!
//! Two operations are exposed:
//! - [`Geocoder::resolve`] turns a postal address into a coordinate, retrying
//!   transient failures with exponential back-off and absorbing every failure
//!   into `None`.
//! - [`NominatimClient::suggest`] is a single-shot free-text lookup for address
//!   autocomplete that surfaces upstream failures to the caller.

use std::time::Duration;

use carpool_core::{
    Address, AppConfig, Coordinate, Diagnostics, Geocoder, TracingDiagnostics,
};
use reqwest::{Client, Url};

use crate::error::GeocodeError;
use crate::retry::{resolve_with_backoff, GeocodeOutcome, RetryPolicy, Sleeper, TokioSleeper};
use crate::types::{AddressSuggestion, NominatimPlace};

/// Minimum number of characters a suggestion query must carry.
pub const MIN_SUGGEST_QUERY_CHARS: usize = 3;

/// Maximum number of suggestions requested per lookup.
pub const SUGGESTION_LIMIT: &str = "5";

/// Connection settings for [`NominatimClient`].
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Sent as `User-Agent`; Nominatim's usage policy rejects anonymous clients.
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
    /// Comma-separated ISO 3166-1 codes restricting suggestions.
    pub country_codes: String,
}

impl GeocoderConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.geocoder_base_url.clone(),
            user_agent: config.geocoder_user_agent.clone(),
            timeout_secs: config.geocoder_timeout_secs,
            retry: RetryPolicy {
                max_attempts: config.geocoder_max_attempts,
                base_delay: Duration::from_millis(config.geocoder_backoff_base_ms),
            },
            country_codes: config.geocoder_country_codes.clone(),
        }
    }
}

/// Client for Nominatim-compatible geocoding services.
///
/// The sleeper and diagnostics sink are type parameters so tests can swap in
/// doubles; production code uses the defaults.
pub struct NominatimClient<S = TokioSleeper, D = TracingDiagnostics> {
    client: Client,
    search_url: Url,
    retry: RetryPolicy,
    country_codes: String,
    sleeper: S,
    diagnostics: D,
}

impl NominatimClient {
    /// Creates a client with the tokio sleeper and `tracing` diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `config.base_url` does not parse.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;

        // Normalise to exactly one trailing slash so `join` appends `search`
        // instead of replacing the last path segment.
        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised)
            .and_then(|base| base.join("search"))
            .map_err(|e| GeocodeError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            search_url,
            retry: config.retry,
            country_codes: config.country_codes.clone(),
            sleeper: TokioSleeper,
            diagnostics: TracingDiagnostics::new("geocoder"),
        })
    }
}

impl<S, D> NominatimClient<S, D> {
    /// Replaces the back-off sleeper.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> NominatimClient<S2, D> {
        NominatimClient {
            client: self.client,
            search_url: self.search_url,
            retry: self.retry,
            country_codes: self.country_codes,
            sleeper,
            diagnostics: self.diagnostics,
        }
    }

    /// Replaces the diagnostics sink.
    pub fn with_diagnostics<D2: Diagnostics>(self, diagnostics: D2) -> NominatimClient<S, D2> {
        NominatimClient {
            client: self.client,
            search_url: self.search_url,
            retry: self.retry,
            country_codes: self.country_codes,
            sleeper: self.sleeper,
            diagnostics,
        }
    }

    /// Builds the `/search` URL for a structured address lookup.
    ///
    /// `street` is only sent when present; Nominatim treats an empty
    /// `street=` as a constraint.
    fn address_url(&self, address: &Address) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(street) = address.street.as_deref() {
                pairs.append_pair("street", street);
            }
            pairs.append_pair("city", &address.city);
            pairs.append_pair("postalcode", &address.zip_code);
            pairs.append_pair("format", "json");
            pairs.append_pair("limit", "1");
        }
        url
    }

    /// Builds the `/search` URL for a free-text suggestion lookup.
    fn suggest_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("format", "json");
            pairs.append_pair("addressdetails", "1");
            pairs.append_pair("limit", SUGGESTION_LIMIT);
            if !self.country_codes.trim().is_empty() {
                pairs.append_pair("countrycodes", self.country_codes.trim());
            }
        }
        url
    }

    /// Sends a GET request and parses the body as a list of places.
    ///
    /// Returns `Ok(None)` for a non-2xx status so callers can decide whether
    /// that is a failure.
    async fn fetch_places(&self, url: &Url) -> Result<Option<Vec<NominatimPlace>>, GeocodeError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response.text().await?;
        let places = serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })?;
        Ok(Some(places))
    }

    /// One structured lookup, classified for the retry loop.
    async fn lookup_once(&self, url: &Url) -> GeocodeOutcome {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return GeocodeOutcome::TransientFailure(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return GeocodeOutcome::TransientFailure(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let places = match response.json::<Vec<NominatimPlace>>().await {
            Ok(places) => places,
            Err(e) => return GeocodeOutcome::TransientFailure(e.into()),
        };

        match places.first().map(NominatimPlace::coordinate) {
            None => GeocodeOutcome::NotFound,
            Some(Ok(coordinate)) => GeocodeOutcome::Found(coordinate),
            Some(Err(e)) => GeocodeOutcome::TransientFailure(e),
        }
    }
}

impl<S, D: Diagnostics> NominatimClient<S, D> {
    /// Looks up address candidates for autocomplete. Single attempt, no retry.
    ///
    /// A non-2xx answer yields an empty list: the service is reachable, it
    /// just has nothing usable. Places whose coordinates do not parse are
    /// skipped.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::QueryTooShort`] if `query` has fewer than
    ///   [`MIN_SUGGEST_QUERY_CHARS`] non-blank characters; no request is sent.
    /// - [`GeocodeError::Http`] on network failure.
    /// - [`GeocodeError::Deserialize`] if the body is not a place list.
    pub async fn suggest(&self, query: &str) -> Result<Vec<AddressSuggestion>, GeocodeError> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGEST_QUERY_CHARS {
            return Err(GeocodeError::QueryTooShort {
                min: MIN_SUGGEST_QUERY_CHARS,
            });
        }

        let url = self.suggest_url(query);
        let places = match self.fetch_places(&url).await {
            Ok(Some(places)) => places,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                self.diagnostics.error(&format!("Geocoding API error: {e}"));
                return Err(e);
            }
        };

        let suggestions = places
            .iter()
            .filter_map(|place| match AddressSuggestion::from_place(place) {
                Ok(suggestion) => Some(suggestion),
                Err(e) => {
                    self.diagnostics
                        .warn(&format!("Skipping suggestion '{}': {e}", place.display_name));
                    None
                }
            })
            .collect();
        Ok(suggestions)
    }
}

impl<S: Sleeper, D: Diagnostics> Geocoder for NominatimClient<S, D> {
    async fn resolve(&self, address: &Address) -> Option<Coordinate> {
        let url = self.address_url(address);
        let label = address.to_string();
        resolve_with_backoff(self.retry, &self.sleeper, &self.diagnostics, &label, || {
            self.lookup_once(&url)
        })
        .await
    }
}
