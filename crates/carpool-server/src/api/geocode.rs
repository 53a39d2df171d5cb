use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use carpool_core::{offers::TEXT_MAX_CHARS, ValidationErrors};
use carpool_geocoder::{AddressSuggestion, GeocodeError, MIN_SUGGEST_QUERY_CHARS};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{rejected, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeParams {
    pub query: Option<String>,
}

/// Address autocomplete for the offer form.
pub(super) async fn suggest_addresses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<AddressSuggestion>>>, ApiError> {
    let Query(params) = params.map_err(|e| rejected(req_id.0.clone(), &e))?;
    let query = params.query.as_deref().map(str::trim).unwrap_or_default();
    validate_query(query).map_err(|errors| ApiError::validation(req_id.0.clone(), &errors))?;

    let suggestions = state.geocoder.suggest(query).await.map_err(|e| match e {
        GeocodeError::QueryTooShort { .. } => {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        }
        _ => ApiError::new(
            req_id.0.clone(),
            "service_unavailable",
            "Geocoding service unavailable",
        ),
    })?;

    Ok(Json(ApiResponse {
        data: suggestions,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn validate_query(query: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if query.is_empty() {
        errors.add("query", "The query field is required.");
    } else if query.chars().count() < MIN_SUGGEST_QUERY_CHARS {
        errors.add(
            "query",
            format!("The query field must be at least {MIN_SUGGEST_QUERY_CHARS} characters."),
        );
    } else if query.chars().count() > TEXT_MAX_CHARS {
        errors.add(
            "query",
            format!("The query field must not be greater than {TEXT_MAX_CHARS} characters."),
        );
    }
    errors.into_result(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::build_app;
    use super::super::test_support::{body_json, get_request, lazy_state};
    use super::validate_query;
    use crate::middleware::WriteRateLimitState;

    fn app(geocoder_url: &str) -> axum::Router {
        build_app(
            lazy_state(geocoder_url),
            WriteRateLimitState::new(5, std::time::Duration::from_secs(3600)),
        )
    }

    #[test]
    fn query_validation_messages() {
        assert!(validate_query("Berlin").is_ok());
        let missing = validate_query("").unwrap_err();
        assert_eq!(missing.get("query"), Some("The query field is required."));
        let short = validate_query("Be").unwrap_err();
        assert_eq!(
            short.get("query"),
            Some("The query field must be at least 3 characters.")
        );
        let long = validate_query(&"a".repeat(256)).unwrap_err();
        assert_eq!(
            long.get("query"),
            Some("The query field must not be greater than 255 characters.")
        );
        assert!(validate_query(&"a".repeat(255)).is_ok());
    }

    #[tokio::test]
    async fn oversized_query_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let uri = format!("/api/v1/geocode?query={}", "a".repeat(300));
        let response = app(&server.uri())
            .oneshot(get_request(&uri))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn short_query_is_rejected_with_400() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get_request("/api/v1/geocode?query=ab"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn upstream_failure_is_503() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get_request("/api/v1/geocode?query=Alexanderplatz"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "service_unavailable");
        assert_eq!(json["error"]["message"], "Geocoding service unavailable");
    }

    #[tokio::test]
    async fn suggestions_are_returned_from_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Alexanderplatz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "lat": "52.5219814",
                "lon": "13.4132418",
                "display_name": "Alexanderplatz, Mitte, Berlin, 10178, Deutschland",
                "address": { "road": "Alexanderplatz", "city": "Berlin", "postcode": "10178" }
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server.uri())
            .oneshot(get_request("/api/v1/geocode?query=Alexanderplatz"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let first = &json["data"][0];
        assert_eq!(first["street"], "Alexanderplatz");
        assert_eq!(first["city"], "Berlin");
        assert_eq!(first["zip_code"], "10178");
    }
}
