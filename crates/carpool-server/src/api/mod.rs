mod geocode;
mod offers;
mod search;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use carpool_core::ValidationErrors;
use carpool_db::PgOfferStore;
use carpool_geocoder::NominatimClient;
use carpool_search::SearchService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_write_rate_limit, request_id, RequestId, WriteRateLimitState};

pub type OfferSearch = SearchService<Arc<NominatimClient>, PgOfferStore>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub geocoder: Arc<NominatimClient>,
    pub search: Arc<OfferSearch>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, geocoder: NominatimClient) -> Self {
        let geocoder = Arc::new(geocoder);
        let store = PgOfferStore::new(pool.clone());
        let search = SearchService::new(Arc::clone(&geocoder), store);
        Self {
            pool,
            geocoder,
            search: Arc::new(search),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Per-field messages for `validation_error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                fields: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// A `validation_error` carrying every rejected field.
    pub fn validation(request_id: impl Into<String>, errors: &ValidationErrors) -> Self {
        let message = errors
            .fields()
            .values()
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());
        let mut error = Self::new(request_id, "validation_error", message);
        error.error.fields = Some(errors.fields().clone());
        error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Turns an extractor rejection into a `bad_request` envelope.
pub(super) fn rejected(request_id: String, rejection: &impl std::fmt::Display) -> ApiError {
    ApiError::new(request_id, "bad_request", rejection.to_string())
}

pub(super) fn map_db_error(request_id: String, error: &carpool_db::DbError) -> ApiError {
    if matches!(error, carpool_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "ride offer not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

/// Offer create/update/delete, limited per client address.
fn write_router(rate_limit: WriteRateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/ride-offers", post(offers::create_offer))
        .route(
            "/api/v1/ride-offers/{key}",
            axum::routing::put(offers::update_offer).delete(offers::delete_offer),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_write_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: WriteRateLimitState) -> Router {
    let read_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/search", get(search::page_search_query).post(search::page_search_form))
        .route("/api/v1/search", post(search::api_search))
        .route("/api/v1/geocode", get(geocode::suggest_addresses))
        .route("/api/v1/overview", get(offers::overview))
        .route("/api/v1/ride-offers", get(offers::list_offers))
        .route("/api/v1/ride-offers/{key}", get(offers::get_offer))
        .route(
            "/api/v1/ride-offers/edit/{edit_code}",
            get(offers::edit_offer),
        )
        .route(
            "/api/v1/ride-offers/confirmation/{edit_code}",
            get(offers::confirmation),
        );

    Router::new()
        .merge(read_routes)
        .merge(write_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match carpool_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
