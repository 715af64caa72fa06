//! Adapter implementing the engine's `Store` trait over a Postgres pool.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use salescast_core::{ForecastResult, MarketBasketResult, SaleItem, SaleWithItems, SalesRecord};
use salescast_engine::{Store, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &crate::SaleRow) -> SalesRecord {
    SalesRecord {
        date: row.date,
        total_amount: row.total_amount.to_f64().unwrap_or(0.0),
        promotion: row.promotion,
    }
}

fn store_error(error: crate::DbError) -> StoreError {
    StoreError(error.to_string())
}

#[async_trait]
impl Store for PgStore {
    async fn sales_since(
        &self,
        owner_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<SalesRecord>, StoreError> {
        let rows = crate::list_sales_since(&self.pool, owner_id, since)
            .await
            .map_err(store_error)?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn recent_sales_since(
        &self,
        owner_id: Uuid,
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<SalesRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = crate::list_recent_sales_since(&self.pool, owner_id, since, limit)
            .await
            .map_err(store_error)?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn sales_with_items_between(
        &self,
        owner_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleWithItems>, StoreError> {
        let rows = crate::list_sales_with_items_between(&self.pool, owner_id, start, end)
            .await
            .map_err(store_error)?;
        Ok(rows
            .into_iter()
            .map(|(sale, items)| SaleWithItems {
                date: sale.date,
                total_amount: sale.total_amount.to_f64().unwrap_or(0.0),
                promotion: sale.promotion,
                items: items
                    .into_iter()
                    .map(|item| SaleItem {
                        product_id: item.product_id,
                        quantity: u32::try_from(item.quantity).unwrap_or(0),
                        price: item.price.to_f64().unwrap_or(0.0),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn insert_forecast(&self, forecast: &ForecastResult) -> Result<Uuid, StoreError> {
        crate::insert_forecast(&self.pool, forecast)
            .await
            .map_err(store_error)
    }

    async fn insert_market_basket(
        &self,
        basket: &MarketBasketResult,
    ) -> Result<Uuid, StoreError> {
        crate::insert_market_basket(&self.pool, basket)
            .await
            .map_err(store_error)
    }
}
