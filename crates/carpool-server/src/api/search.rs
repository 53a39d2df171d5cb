//! Proximity search handlers.
//!
//! `/search` serves the search page: an empty form yields an empty result.
//! `/api/v1/search` always validates.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use carpool_core::{Coordinate, Offer, SearchQuery, SearchStrategy, DEFAULT_RADIUS_KM};
use serde::{Deserialize, Deserializer, Serialize};

use crate::middleware::RequestId;

use super::{rejected, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchForm {
    pub zip_code: Option<String>,
    pub city: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub radius: Option<i64>,
}

/// Accepts a number, a numeric string, or a blank string (as an empty form
/// field arrives), the last meaning "not given".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRadius {
        Number(i64),
        Text(String),
    }

    match Option::<RawRadius>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawRadius::Number(n)) => Ok(Some(n)),
        Some(RawRadius::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom("radius must be an integer"))
        }
    }
}

impl SearchForm {
    fn is_blank(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.zip_code) && blank(&self.city)
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SearchParams {
    pub zip_code: String,
    pub city: String,
    pub radius: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    #[serde(rename = "rideOffers")]
    pub ride_offers: Vec<Offer>,
    #[serde(rename = "searchParams")]
    pub search_params: SearchParams,
    #[serde(rename = "searchCoordinates")]
    pub search_coordinates: Option<Coordinate>,
    /// `None` when no search ran.
    pub strategy: Option<SearchStrategy>,
}

impl SearchData {
    fn empty() -> Self {
        Self {
            ride_offers: Vec::new(),
            search_params: SearchParams {
                zip_code: String::new(),
                city: String::new(),
                radius: DEFAULT_RADIUS_KM,
            },
            search_coordinates: None,
            strategy: None,
        }
    }
}

pub(super) async fn page_search_query(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    form: Result<Query<SearchForm>, QueryRejection>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let Query(form) = form.map_err(|e| rejected(req_id.0.clone(), &e))?;
    page_search(&state, req_id, form).await
}

pub(super) async fn page_search_form(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    form: Result<Json<SearchForm>, JsonRejection>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let Json(form) = form.map_err(|e| rejected(req_id.0.clone(), &e))?;
    page_search(&state, req_id, form).await
}

async fn page_search(
    state: &AppState,
    req_id: RequestId,
    form: SearchForm,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    if form.is_blank() {
        return Ok(Json(ApiResponse {
            data: SearchData::empty(),
            meta: ResponseMeta::new(req_id.0),
        }));
    }
    run_search(state, req_id, &form).await
}

pub(super) async fn api_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    form: Result<Json<SearchForm>, JsonRejection>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let Json(form) = form.map_err(|e| rejected(req_id.0.clone(), &e))?;
    run_search(&state, req_id, &form).await
}

async fn run_search(
    state: &AppState,
    req_id: RequestId,
    form: &SearchForm,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let query = SearchQuery::new(
        form.zip_code.as_deref().unwrap_or(""),
        form.city.as_deref().unwrap_or(""),
        form.radius,
    )
    .map_err(|errors| ApiError::validation(req_id.0.clone(), &errors))?;

    let result = state.search.search(&query).await.map_err(|e| {
        tracing::error!(error = %e, "search failed");
        ApiError::new(req_id.0.clone(), "internal_error", "search failed")
    })?;

    let data = SearchData {
        ride_offers: result.offers,
        search_params: SearchParams {
            zip_code: query.address().zip_code.clone(),
            city: query.address().city.clone(),
            radius: query.radius_km(),
        },
        search_coordinates: result.coordinates,
        strategy: Some(result.strategy),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
