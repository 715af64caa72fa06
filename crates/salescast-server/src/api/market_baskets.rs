//! Market-basket analysis endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use salescast_core::MarketBasketResult;
use salescast_db::MarketBasketRow;
use salescast_engine::BasketRequest;
use serde::Serialize;
use serde_json::Value;

use super::{map_db_error, map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::{OwnerId, RequestId};

const LIST_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBasketView {
    id: uuid::Uuid,
    analysis_date: chrono::DateTime<chrono::Utc>,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    min_support: f64,
    min_confidence: f64,
    itemsets: Value,
    rules: Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<MarketBasketRow> for MarketBasketView {
    fn from(row: MarketBasketRow) -> Self {
        Self {
            id: row.id,
            analysis_date: row.analysis_date,
            start_date: row.start_date,
            end_date: row.end_date,
            min_support: row.min_support,
            min_confidence: row.min_confidence,
            itemsets: row.itemsets,
            rules: row.rules,
            created_at: row.created_at,
        }
    }
}

pub async fn generate_market_basket(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(request): Json<BasketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MarketBasketResult>>), ApiError> {
    let result = state
        .engine
        .generate_market_basket(owner_id, &request)
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

pub async fn list_market_baskets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
) -> Result<Json<ApiResponse<Vec<MarketBasketView>>>, ApiError> {
    let rows = salescast_db::list_market_baskets(&state.pool, owner_id, LIST_LIMIT)
        .await
        .map_err(|error| map_db_error(req_id.0.clone(), &error))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Into::into).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
