//! Database operations for the `forecasts` table.
//!
//! Forecast documents are write-once: there is no update path, retraining
//! inserts a new row.

use chrono::{DateTime, NaiveDate, Utc};
use salescast_core::ForecastResult;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `forecasts` table. The document fields stay as JSONB
/// values here; the API layer serves them as-is.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ForecastRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub forecast_period: String,
    pub model_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub predictions: Value,
    pub features: Value,
    pub metrics: Value,
    pub alert: Value,
    pub created_at: DateTime<Utc>,
}

/// One page of an owner's forecasts, newest first.
#[derive(Debug, Clone)]
pub struct ForecastPage {
    pub forecasts: Vec<ForecastRow>,
    pub total: i64,
}

/// Insert a forecast result and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if a document field cannot be serialized,
/// or [`DbError::Sqlx`] if the insert fails.
pub async fn insert_forecast(pool: &PgPool, forecast: &ForecastResult) -> Result<Uuid, DbError> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO forecasts \
             (owner_id, forecast_period, model_type, start_date, end_date, \
              predictions, features, metrics, alert) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(forecast.owner_id)
    .bind(forecast.forecast_period.to_string())
    .bind(forecast.model_type.to_string())
    .bind(forecast.start_date)
    .bind(forecast.end_date)
    .bind(serde_json::to_value(&forecast.predictions)?)
    .bind(serde_json::to_value(&forecast.features)?)
    .bind(serde_json::to_value(&forecast.metrics)?)
    .bind(serde_json::to_value(&forecast.alert)?)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List an owner's forecasts, newest first, optionally filtered by period,
/// with offset pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_forecasts(
    pool: &PgPool,
    owner_id: Uuid,
    forecast_period: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ForecastPage, DbError> {
    let forecasts = sqlx::query_as::<_, ForecastRow>(
        "SELECT id, owner_id, forecast_period, model_type, start_date, end_date, \
                predictions, features, metrics, alert, created_at \
         FROM forecasts \
         WHERE owner_id = $1 AND ($2::TEXT IS NULL OR forecast_period = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4",
    )
    .bind(owner_id)
    .bind(forecast_period)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM forecasts \
         WHERE owner_id = $1 AND ($2::TEXT IS NULL OR forecast_period = $2)",
    )
    .bind(owner_id)
    .bind(forecast_period)
    .fetch_one(pool)
    .await?;

    Ok(ForecastPage { forecasts, total })
}
