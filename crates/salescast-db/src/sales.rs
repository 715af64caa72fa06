//! Database operations for the `sales` and `sale_items` tables.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sales` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub total_amount: Decimal,
    pub promotion: bool,
    pub created_at: DateTime<Utc>,
}

/// A row from the `sale_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleItemRow {
    pub id: i64,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

/// A new sale to insert, with its line items.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub total_amount: Decimal,
    pub promotion: bool,
    pub items: Vec<NewSaleItem>,
}

#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a sale and its items in one transaction; returns the sale id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn insert_sale(pool: &PgPool, sale: &NewSale) -> Result<Uuid, DbError> {
    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO sales (owner_id, date, total_amount, promotion) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(sale.owner_id)
    .bind(sale.date)
    .bind(sale.total_amount)
    .bind(sale.promotion)
    .fetch_one(&mut *tx)
    .await?;

    for item in &sale.items {
        sqlx::query(
            "INSERT INTO sale_items (sale_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(id)
}

/// All of an owner's sales with `date >= since`, ascending by date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sales_since(
    pool: &PgPool,
    owner_id: Uuid,
    since: NaiveDate,
) -> Result<Vec<SaleRow>, DbError> {
    let rows = sqlx::query_as::<_, SaleRow>(
        "SELECT id, owner_id, date, total_amount, promotion, created_at \
         FROM sales \
         WHERE owner_id = $1 AND date >= $2 \
         ORDER BY date ASC, id ASC",
    )
    .bind(owner_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The owner's most recent sales with `date >= since`, descending, capped
/// at `limit` rows. Used by the retraining flow's bounded sample.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_sales_since(
    pool: &PgPool,
    owner_id: Uuid,
    since: NaiveDate,
    limit: i64,
) -> Result<Vec<SaleRow>, DbError> {
    let rows = sqlx::query_as::<_, SaleRow>(
        "SELECT id, owner_id, date, total_amount, promotion, created_at \
         FROM sales \
         WHERE owner_id = $1 AND date >= $2 \
         ORDER BY date DESC, id DESC \
         LIMIT $3",
    )
    .bind(owner_id)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Line items for a batch of sales.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sale_items(
    pool: &PgPool,
    sale_ids: &[Uuid],
) -> Result<Vec<SaleItemRow>, DbError> {
    let rows = sqlx::query_as::<_, SaleItemRow>(
        "SELECT id, sale_id, product_id, quantity, price \
         FROM sale_items \
         WHERE sale_id = ANY($1) \
         ORDER BY sale_id, id",
    )
    .bind(sale_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sales in `[start, end]` (inclusive) with their line items, for
/// market-basket analysis.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_sales_with_items_between(
    pool: &PgPool,
    owner_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(SaleRow, Vec<SaleItemRow>)>, DbError> {
    let sales = sqlx::query_as::<_, SaleRow>(
        "SELECT id, owner_id, date, total_amount, promotion, created_at \
         FROM sales \
         WHERE owner_id = $1 AND date >= $2 AND date <= $3 \
         ORDER BY date ASC, id ASC",
    )
    .bind(owner_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    let sale_ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
    let mut by_sale: std::collections::HashMap<Uuid, Vec<SaleItemRow>> =
        std::collections::HashMap::new();
    for item in list_sale_items(pool, &sale_ids).await? {
        by_sale.entry(item.sale_id).or_default().push(item);
    }

    Ok(sales
        .into_iter()
        .map(|sale| {
            let items = by_sale.remove(&sale.id).unwrap_or_default();
            (sale, items)
        })
        .collect())
}

/// Owners that have at least `min_count` sales with `date >= since`.
/// Drives the scheduled retraining sweep.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_owners_with_min_sales(
    pool: &PgPool,
    since: NaiveDate,
    min_count: i64,
) -> Result<Vec<Uuid>, DbError> {
    let owners: Vec<Uuid> = sqlx::query_scalar(
        "SELECT owner_id \
         FROM sales \
         WHERE date >= $1 \
         GROUP BY owner_id \
         HAVING COUNT(*) >= $2 \
         ORDER BY owner_id",
    )
    .bind(since)
    .bind(min_count)
    .fetch_all(pool)
    .await?;

    Ok(owners)
}
