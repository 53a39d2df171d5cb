//! Ride offer handlers: listing, overview, create, edit-by-code, update,
//! delete.
//!
//! Write access is granted by possession of the offer's edit code.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use carpool_core::{offers::OfferInput, Offer, OfferFields};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, rejected, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct PageParams {
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct OfferPageData {
    pub items: Vec<Offer>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// An offer together with its edit code, returned only to its poster.
#[derive(Debug, Serialize)]
pub(super) struct OfferWithCode {
    #[serde(flatten)]
    pub offer: Offer,
    pub edit_code: String,
}

impl From<Offer> for OfferWithCode {
    fn from(offer: Offer) -> Self {
        let edit_code = offer.edit_code.clone();
        Self { offer, edit_code }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedData {
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub(super) async fn list_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<ApiResponse<OfferPageData>>, ApiError> {
    let Query(params) = params.map_err(|e| rejected(req_id.0.clone(), &e))?;
    let page = carpool_db::list_offers_page(&state.pool, params.page.unwrap_or(1))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OfferPageData {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Every located offer, for the map.
pub(super) async fn overview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Offer>>>, ApiError> {
    let offers = carpool_db::list_located_offers(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: offers,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Offer>>, ApiError> {
    let Ok(id) = key.parse::<i64>() else {
        return Err(ApiError::new(req_id.0, "not_found", "ride offer not found"));
    };

    let offer = carpool_db::get_offer(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: offer,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn edit_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(edit_code): Path<String>,
) -> Result<Json<ApiResponse<OfferWithCode>>, ApiError> {
    offer_by_code(&state, req_id, &edit_code).await
}

pub(super) async fn confirmation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(edit_code): Path<String>,
) -> Result<Json<ApiResponse<OfferWithCode>>, ApiError> {
    offer_by_code(&state, req_id, &edit_code).await
}

async fn offer_by_code(
    state: &AppState,
    req_id: RequestId,
    edit_code: &str,
) -> Result<Json<ApiResponse<OfferWithCode>>, ApiError> {
    let offer = carpool_db::get_offer_by_edit_code(&state.pool, edit_code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: offer.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

pub(super) async fn create_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    input: Result<Json<OfferInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<OfferWithCode>>), ApiError> {
    let Json(input) = input.map_err(|e| rejected(req_id.0.clone(), &e))?;
    let fields = OfferFields::validate(&input)
        .map_err(|errors| ApiError::validation(req_id.0.clone(), &errors))?;

    let coordinates = state.search.assign_coordinates(&fields, None).await;
    let offer = carpool_db::insert_offer(
        &state.pool,
        &fields,
        coordinates,
        Utc::now().date_naive(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        offer_id = offer.id,
        located = offer.coordinates.is_some(),
        "ride offer created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: offer.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn update_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(edit_code): Path<String>,
    input: Result<Json<OfferInput>, JsonRejection>,
) -> Result<Json<ApiResponse<OfferWithCode>>, ApiError> {
    let Json(input) = input.map_err(|e| rejected(req_id.0.clone(), &e))?;
    let fields = OfferFields::validate(&input)
        .map_err(|errors| ApiError::validation(req_id.0.clone(), &errors))?;

    let previous = carpool_db::get_offer_by_edit_code(&state.pool, &edit_code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let coordinates = state
        .search
        .assign_coordinates(&fields, Some(&previous))
        .await;
    let offer = carpool_db::update_offer(&state.pool, &edit_code, &fields, coordinates)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(offer_id = offer.id, "ride offer updated");

    Ok(Json(ApiResponse {
        data: offer.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(edit_code): Path<String>,
) -> Result<Json<ApiResponse<DeletedData>>, ApiError> {
    carpool_db::delete_offer(&state.pool, &edit_code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!("ride offer deleted");

    Ok(Json(ApiResponse {
        data: DeletedData { deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use carpool_core::Coordinate;
    use chrono::Utc;
    use tower::ServiceExt;

    use super::super::build_app;
    use super::super::test_support::{body_json, get_request, json_request, lazy_state};
    use super::*;
    use crate::middleware::WriteRateLimitState;

    fn app() -> axum::Router {
        build_app(
            lazy_state("http://127.0.0.1:1"),
            WriteRateLimitState::new(50, std::time::Duration::from_secs(3600)),
        )
    }

    fn sample_offer() -> Offer {
        Offer {
            id: 11,
            zip_code: "10115".to_string(),
            city: "Berlin".to_string(),
            street: None,
            last_name: "Schmidt".to_string(),
            first_name: None,
            email: "anna@example.org".to_string(),
            class_name: Some("10b".to_string()),
            phone: None,
            valid_from: None,
            valid_until: None,
            cost_info: None,
            additional_info: None,
            coordinates: Some(Coordinate::new(52.52, 13.405).unwrap()),
            edit_code: "Ab3dE6gH9k".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_offer_json_hides_edit_code_and_flattens_coordinates() {
        let json = serde_json::to_value(sample_offer()).unwrap();
        assert!(json.get("edit_code").is_none());
        assert_eq!(json["latitude"], 52.52);
        assert_eq!(json["longitude"], 13.405);
        assert_eq!(json["class"], "10b");
    }

    #[test]
    fn confirmation_json_includes_edit_code() {
        let json = serde_json::to_value(OfferWithCode::from(sample_offer())).unwrap();
        assert_eq!(json["edit_code"], "Ab3dE6gH9k");
        assert_eq!(json["id"], 11);
    }

    #[tokio::test]
    async fn create_rejects_invalid_offer() {
        let body = serde_json::json!({
            "zip_code": "10115",
            "city": "Berlin",
            "last_name": "Schmidt",
            "email": "not-an-email"
        });
        let response = app()
            .oneshot(json_request("POST", "/api/v1/ride-offers", &body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"]["fields"]["email"],
            "The email field must be a valid email address."
        );
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let response = app()
            .oneshot(json_request(
                "PUT",
                "/api/v1/ride-offers/Ab3dE6gH9k",
                &serde_json::json!({ "city": "Berlin" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"]["fields"]["zip_code"].is_string());
        assert!(json["error"]["fields"]["last_name"].is_string());
    }

    #[tokio::test]
    async fn non_numeric_offer_id_is_not_found() {
        let response = app()
            .oneshot(get_request("/api/v1/ride-offers/abc"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn non_numeric_page_keeps_error_envelope() {
        let response = app()
            .oneshot(get_request("/api/v1/ride-offers?page=first"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "bad_request");
    }
}
