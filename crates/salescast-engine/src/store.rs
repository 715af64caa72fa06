//! Persistence interface consumed by the orchestrators.
//!
//! The engine treats storage as a simple store-and-retrieve document
//! interface; the Postgres layer adapts itself to this trait and tests
//! use an in-memory implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use salescast_core::{ForecastResult, MarketBasketResult, SaleWithItems, SalesRecord};
use uuid::Uuid;

use crate::error::StoreError;

#[async_trait]
pub trait Store: Send + Sync {
    /// All of an owner's sales with `date >= since`, ascending by date.
    async fn sales_since(
        &self,
        owner_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<SalesRecord>, StoreError>;

    /// The owner's most recent sales with `date >= since`, descending by
    /// date, at most `limit` records.
    async fn recent_sales_since(
        &self,
        owner_id: Uuid,
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<SalesRecord>, StoreError>;

    /// Sales with their line items where `start <= date <= end`.
    async fn sales_with_items_between(
        &self,
        owner_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleWithItems>, StoreError>;

    async fn insert_forecast(&self, forecast: &ForecastResult) -> Result<Uuid, StoreError>;

    async fn insert_market_basket(&self, basket: &MarketBasketResult)
        -> Result<Uuid, StoreError>;
}
