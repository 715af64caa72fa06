//! Model invocation gateway: the retry boundary around the external model.
//!
//! [`ModelBackend`] is one attempt against the black-box computation; any
//! implementation may realize it as a subprocess (see
//! [`crate::ScriptBackend`]), an RPC call, or an embedded library.
//! [`Gateway`] wraps a backend with the forecasting retry policy: up to
//! `max_attempts` tries with linear backoff, each failure warn-logged,
//! only the final attempt's error surfaced. The market-basket path is a
//! single attempt with no retry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use salescast_core::{ForecastPeriod, ModelType};
use serde_json::Value;

use crate::error::GatewayError;

/// One forecasting invocation: the serialized dataset plus the positional
/// arguments of the model contract.
#[derive(Debug, Clone)]
pub struct ForecastJob {
    pub dataset_json: String,
    pub period: ForecastPeriod,
    pub model: ModelType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One basket-mining invocation.
#[derive(Debug, Clone)]
pub struct BasketJob {
    pub dataset_json: String,
    pub min_support: f64,
    pub min_confidence: f64,
}

/// A single attempt against the external model computation.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn run_forecast(&self, job: &ForecastJob) -> Result<Value, GatewayError>;

    async fn run_basket(&self, job: &BasketJob) -> Result<Value, GatewayError>;
}

/// Retry policy wrapper around a [`ModelBackend`].
#[derive(Debug)]
pub struct Gateway<B> {
    pub(crate) backend: B,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl<B: ModelBackend> Gateway<B> {
    /// `max_attempts` is the total number of tries (first attempt included)
    /// and must be at least 1. Backoff before attempt `n + 1` is
    /// `n × backoff_unit`.
    pub fn new(backend: B, max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Invoke the forecasting computation, retrying transparently up to
    /// the attempt budget.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's [`GatewayError`] once the budget is
    /// exhausted; earlier failures are logged as warnings only.
    pub async fn forecast(&self, job: &ForecastJob) -> Result<Value, GatewayError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.backend.run_forecast(job).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(attempt, error = %error, "forecast model attempt failed");
                    if attempt >= self.max_attempts {
                        return Err(error);
                    }
                    tokio::time::sleep(self.backoff_unit * attempt).await;
                }
            }
        }
    }

    /// Invoke the basket-mining computation. Single attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`GatewayError`] unchanged.
    pub async fn basket(&self, job: &BasketJob) -> Result<Value, GatewayError> {
        self.backend.run_basket(job).await
    }
}
