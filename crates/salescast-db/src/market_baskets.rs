//! Database operations for the `market_baskets` table.

use chrono::{DateTime, NaiveDate, Utc};
use salescast_core::MarketBasketResult;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `market_baskets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MarketBasketRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub analysis_date: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_support: f64,
    pub min_confidence: f64,
    pub itemsets: Value,
    pub rules: Value,
    pub created_at: DateTime<Utc>,
}

/// Insert a market-basket analysis and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if itemsets/rules cannot be serialized, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_market_basket(
    pool: &PgPool,
    basket: &MarketBasketResult,
) -> Result<Uuid, DbError> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO market_baskets \
             (owner_id, analysis_date, start_date, end_date, \
              min_support, min_confidence, itemsets, rules) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(basket.owner_id)
    .bind(basket.analysis_date)
    .bind(basket.start_date)
    .bind(basket.end_date)
    .bind(basket.min_support)
    .bind(basket.min_confidence)
    .bind(serde_json::to_value(&basket.itemsets)?)
    .bind(serde_json::to_value(&basket.rules)?)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List an owner's most recent analyses, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_market_baskets(
    pool: &PgPool,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<MarketBasketRow>, DbError> {
    let rows = sqlx::query_as::<_, MarketBasketRow>(
        "SELECT id, owner_id, analysis_date, start_date, end_date, \
                min_support, min_confidence, itemsets, rules, created_at \
         FROM market_baskets \
         WHERE owner_id = $1 \
         ORDER BY analysis_date DESC, id DESC \
         LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
