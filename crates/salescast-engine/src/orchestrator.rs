//! Forecast and market-basket orchestrators.
//!
//! Each request runs the same terminal pipeline: validate, fetch, invoke,
//! normalize, persist. A failure at any stage is terminal for that
//! request; only the model invocation retries internally (forecasting
//! path only), and the caller must issue a new request after a failure.

use chrono::Utc;
use salescast_core::{ForecastResult, MarketBasketResult};
use uuid::Uuid;

use crate::dataset::{
    ensure_sufficient, lookback_start, serialize_dataset, sort_chronologically,
    RETRAIN_SAMPLE_LIMIT,
};
use crate::error::EngineError;
use crate::gateway::{BasketJob, ForecastJob, Gateway, ModelBackend};
use crate::normalize::{normalize_basket, normalize_forecast};
use crate::request::{BasketRequest, ForecastRequest, RetrainRequest, ValidForecastRequest};
use crate::store::Store;

/// The forecasting and basket-analysis engine. One instance serves all
/// requests; each call is an independent, self-contained unit of work.
pub struct ForecastEngine<B, S> {
    gateway: Gateway<B>,
    store: S,
}

impl<B: ModelBackend, S: Store> ForecastEngine<B, S> {
    pub fn new(gateway: Gateway<B>, store: S) -> Self {
        Self { gateway, store }
    }

    /// Generate a forecast over the full historical window.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] naming the failed stage; see the crate's
    /// error taxonomy. Client-caused failures happen before any model
    /// invocation and have no side effects.
    pub async fn generate_forecast(
        &self,
        owner_id: Uuid,
        request: &ForecastRequest,
    ) -> Result<ForecastResult, EngineError> {
        let valid = request.validate()?;

        let sales = self
            .store
            .sales_since(owner_id, lookback_start(valid.start))
            .await?;
        ensure_sufficient(sales.len())?;

        self.invoke_and_persist(owner_id, valid, &sales).await
    }

    /// Retrain: same pipeline, but over a bounded sample of the most
    /// recent [`RETRAIN_SAMPLE_LIMIT`] records within the lookback window.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::generate_forecast`].
    pub async fn retrain_forecast(
        &self,
        owner_id: Uuid,
        request: &RetrainRequest,
    ) -> Result<ForecastResult, EngineError> {
        let valid = request.validate()?;

        let recent = self
            .store
            .recent_sales_since(owner_id, lookback_start(valid.start), RETRAIN_SAMPLE_LIMIT)
            .await?;
        ensure_sufficient(recent.len())?;
        let sales = sort_chronologically(recent);

        self.invoke_and_persist(owner_id, valid, &sales).await
    }

    async fn invoke_and_persist(
        &self,
        owner_id: Uuid,
        valid: ValidForecastRequest,
        sales: &[salescast_core::SalesRecord],
    ) -> Result<ForecastResult, EngineError> {
        let job = ForecastJob {
            dataset_json: serialize_dataset(sales)?,
            period: valid.period,
            model: valid.model,
            start: valid.start,
            end: valid.end,
        };

        let raw = self.gateway.forecast(&job).await.map_err(|error| {
            tracing::error!(
                owner_id = %owner_id,
                model = %valid.model,
                error = %error,
                "forecast model invocation failed after retries"
            );
            error
        })?;

        let normalized = normalize_forecast(&raw).map_err(|error| {
            tracing::error!(owner_id = %owner_id, error = %error, "invalid forecast model output");
            error
        })?;

        let result = ForecastResult {
            owner_id,
            predictions: normalized.predictions,
            forecast_period: valid.period,
            model_type: valid.model,
            start_date: valid.start,
            end_date: valid.end,
            features: normalized.features,
            metrics: normalized.metrics,
            alert: normalized.alert,
        };

        let id = self.store.insert_forecast(&result).await.map_err(|error| {
            tracing::error!(owner_id = %owner_id, error = %error, "failed to persist forecast");
            error
        })?;

        tracing::info!(
            owner_id = %owner_id,
            forecast_id = %id,
            model = %valid.model,
            period = %valid.period,
            predictions = result.predictions.len(),
            alert = result.alert.is_active,
            "forecast generated"
        );
        Ok(result)
    }

    /// Run a market-basket analysis over the transactions in the window.
    ///
    /// Single model attempt, no retry; the parsed output is accepted
    /// as-is.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::generate_forecast`], without the retry
    /// budget on the invocation stage.
    pub async fn generate_market_basket(
        &self,
        owner_id: Uuid,
        request: &BasketRequest,
    ) -> Result<MarketBasketResult, EngineError> {
        let valid = request.validate()?;

        let sales = self
            .store
            .sales_with_items_between(owner_id, valid.start, valid.end)
            .await?;
        ensure_sufficient(sales.len())?;

        let job = BasketJob {
            dataset_json: serialize_dataset(&sales)?,
            min_support: valid.min_support,
            min_confidence: valid.min_confidence,
        };

        let raw = self.gateway.basket(&job).await.map_err(|error| {
            tracing::error!(owner_id = %owner_id, error = %error, "basket model invocation failed");
            error
        })?;

        let (itemsets, rules) = normalize_basket(raw).map_err(|error| {
            tracing::error!(owner_id = %owner_id, error = %error, "invalid basket model output");
            error
        })?;

        let result = MarketBasketResult {
            owner_id,
            analysis_date: Utc::now(),
            start_date: valid.start,
            end_date: valid.end,
            min_support: valid.min_support,
            min_confidence: valid.min_confidence,
            itemsets,
            rules,
        };

        let id = self
            .store
            .insert_market_basket(&result)
            .await
            .map_err(|error| {
                tracing::error!(owner_id = %owner_id, error = %error, "failed to persist basket analysis");
                error
            })?;

        tracing::info!(
            owner_id = %owner_id,
            basket_id = %id,
            itemsets = result.itemsets.len(),
            rules = result.rules.len(),
            "market basket analysis generated"
        );
        Ok(result)
    }
}
