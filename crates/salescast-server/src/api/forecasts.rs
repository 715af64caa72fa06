//! Forecast endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use salescast_core::ForecastResult;
use salescast_db::ForecastRow;
use salescast_engine::{ForecastRequest, RetrainRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{map_db_error, map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::{OwnerId, RequestId};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    forecast_period: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastListData {
    forecasts: Vec<ForecastView>,
    total: i64,
    page: i64,
    total_pages: i64,
}

/// A stored forecast as served to clients. Document fields come back
/// from JSONB untouched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastView {
    id: uuid::Uuid,
    forecast_period: String,
    model_type: String,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    predictions: Value,
    features: Value,
    metrics: Value,
    alert: Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ForecastRow> for ForecastView {
    fn from(row: ForecastRow) -> Self {
        Self {
            id: row.id,
            forecast_period: row.forecast_period,
            model_type: row.model_type,
            start_date: row.start_date,
            end_date: row.end_date,
            predictions: row.predictions,
            features: row.features,
            metrics: row.metrics,
            alert: row.alert,
            created_at: row.created_at,
        }
    }
}

pub async fn generate_forecast(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(request): Json<ForecastRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ForecastResult>>), ApiError> {
    let result = state
        .engine
        .generate_forecast(owner_id, &request)
        .await
        .map_err(|error| map_engine_error(req_id.0.clone(), &error))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: result,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub async fn retrain_forecast(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(request): Json<RetrainRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ForecastResult>>), ApiError> {
    let result = state
        .engine
        .retrain_forecast(owner_id, &request)
        .await
        .map_err(|error| map_engine_error(req_id.0.clone(), &error))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: result,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub async fn list_forecasts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ForecastListData>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let page_rows = salescast_db::list_forecasts(
        &state.pool,
        owner_id,
        query.forecast_period.as_deref(),
        limit,
        offset,
    )
    .await
    .map_err(|error| map_db_error(req_id.0.clone(), &error))?;

    let total_pages = (page_rows.total + limit - 1) / limit;
    Ok(Json(ApiResponse {
        data: ForecastListData {
            forecasts: page_rows.forecasts.into_iter().map(Into::into).collect(),
            total: page_rows.total,
            page,
            total_pages,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
