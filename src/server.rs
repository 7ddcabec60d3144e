//! HTTP surface: health check and scan endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use crate::error::ScanError;
use crate::scan::ScanOrchestrator;
use crate::types::{ScanRequest, ScanResponse};

/// Service identity reported by the health endpoint.
pub const SERVICE_NAME: &str = "web-analysis-service";

/// Builds the service router.
pub fn router(orchestrator: ScanOrchestrator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scan", post(scan))
        .with_state(orchestrator)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "OK", "service": SERVICE_NAME }))
}

async fn scan(
    State(orchestrator): State<ScanOrchestrator>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, ScanError> {
    let Json(request) =
        payload.map_err(|rejection| ScanError::InvalidRequest(rejection.body_text()))?;

    let response = orchestrator.scan(request).await.map_err(|err| {
        if !err.is_validation() {
            error!("scan failed: {err}");
        }
        err
    })?;

    Ok(Json(response))
}

/// The caller always receives a JSON body: either a populated response or
/// an error/message pair, never a bare transport-level failure.
impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ScanError::MissingUrl => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "URL is required" }),
            ),
            ScanError::InvalidUrl(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid URL", "details": err.to_string() }),
            ),
            ScanError::InvalidRequest(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request body", "details": details }),
            ),
            other => {
                let status = if other.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (
                    status,
                    json!({ "error": "Scan failed", "message": other.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_url_maps_to_400() {
        let response = ScanError::MissingUrl.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_url_maps_to_400() {
        let err: ScanError = url::Url::parse("not-a-url").unwrap_err().into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn timeouts_map_to_504() {
        let response = ScanError::GlobalTimeout(Duration::from_secs(30)).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let response =
            ScanError::Navigation("Navigation timeout of 45000 ms exceeded".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn other_failures_map_to_500() {
        let response = ScanError::Audit("engine crashed".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ScanError::Config("node missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
