mod forecasts;
mod market_baskets;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, require_owner, RequestId};
use crate::store::AppEngine;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: Arc<AppEngine>,
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
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "insufficient_data" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Map an engine failure to the client-facing error envelope.
///
/// Client-caused failures keep their specific, actionable message;
/// server-side failures get a generic message while the detail has
/// already been logged inside the engine.
pub(super) fn map_engine_error(
    request_id: String,
    error: &salescast_engine::EngineError,
) -> ApiError {
    use salescast_engine::EngineError;

    if error.is_client_error() {
        let code = match error {
            EngineError::InsufficientData { .. } => "insufficient_data",
            _ => "validation_error",
        };
        return ApiError::new(request_id, code, error.to_string());
    }

    let message = match error {
        EngineError::Store(_) => "failed to persist result",
        _ => "forecast pipeline failed",
    };
    ApiError::new(request_id, "internal_error", message)
}

pub(super) fn map_db_error(request_id: String, error: &salescast_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-owner-id"),
        ])
}

fn owner_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/forecasts",
            get(forecasts::list_forecasts).post(forecasts::generate_forecast),
        )
        .route(
            "/api/v1/forecasts/retrain",
            post(forecasts::retrain_forecast),
        )
        .route(
            "/api/v1/market-baskets",
            get(market_baskets::list_market_baskets).post(market_baskets::generate_market_basket),
        )
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(require_owner)))
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(owner_router())
        .layer(axum::middleware::from_fn(request_id))
        .layer(build_cors())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<HealthData>>, ApiError> {
    match salescast_db::ping(&state.pool).await {
        Ok(()) => Ok(Json(ApiResponse {
            data: HealthData {
                status: "ok",
                database: "up",
            },
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(error) => {
            tracing::error!(error = %error, "health check database ping failed");
            Err(ApiError::new(req_id.0, "internal_error", "database down"))
        }
    }
}

#[cfg(test)]
mod tests {
    use salescast_engine::{EngineError, GatewayError};

    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let error = EngineError::InsufficientData {
            required: 10,
            found: 4,
        };
        let api = map_engine_error("req-1".to_string(), &error);
        assert_eq!(api.error.code, "insufficient_data");
        assert!(api.error.message.contains("at least 10 sales records"));

        let error = EngineError::Validation("startDate must be before endDate".to_string());
        let api = map_engine_error("req-1".to_string(), &error);
        assert_eq!(api.error.code, "validation_error");
        assert_eq!(api.error.message, "startDate must be before endDate");
    }

    #[test]
    fn server_errors_get_a_generic_message() {
        let error = EngineError::Model(GatewayError::Model("model diverged".to_string()));
        let api = map_engine_error("req-1".to_string(), &error);
        assert_eq!(api.error.code, "internal_error");
        // Model detail stays in the log, not in the response body.
        assert!(!api.error.message.contains("diverged"));
    }
}
