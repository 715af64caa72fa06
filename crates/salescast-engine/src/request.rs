//! Request types and their validation gates.
//!
//! Requests arrive with raw string fields (the HTTP layer passes them
//! through untouched); validation turns them into typed values before any
//! store or gateway call. Any violation is a client error with a specific
//! message and no side effects.

use chrono::NaiveDate;
use salescast_core::{ForecastPeriod, ModelType};
use serde::Deserialize;

use crate::error::EngineError;

const DEFAULT_MIN_SUPPORT: f64 = 0.01;
const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Raw forecast-generation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub forecast_period: String,
    pub model_type: String,
    pub start_date: String,
    pub end_date: String,
}

/// Raw retraining request. Period and model are optional and default to
/// `Monthly` / `RandomForest`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrainRequest {
    #[serde(default)]
    pub forecast_period: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

/// Raw market-basket request. Thresholds default to 0.01 / 0.5.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketRequest {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub min_support: Option<f64>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
}

/// A forecast request that has passed all validation gates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidForecastRequest {
    pub period: ForecastPeriod,
    pub model: ModelType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A market-basket request that has passed all validation gates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidBasketRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub min_support: f64,
    pub min_confidence: f64,
}

impl ForecastRequest {
    pub(crate) fn validate(&self) -> Result<ValidForecastRequest, EngineError> {
        validate_forecast_fields(
            &self.forecast_period,
            &self.model_type,
            &self.start_date,
            &self.end_date,
        )
    }
}

impl RetrainRequest {
    pub(crate) fn validate(&self) -> Result<ValidForecastRequest, EngineError> {
        let period = self.forecast_period.as_deref().unwrap_or("Monthly");
        let model = self.model_type.as_deref().unwrap_or("RandomForest");
        validate_forecast_fields(period, model, &self.start_date, &self.end_date)
    }
}

impl BasketRequest {
    pub(crate) fn validate(&self) -> Result<ValidBasketRequest, EngineError> {
        let (start, end) = validate_window(&self.start_date, &self.end_date)?;
        let min_support = validate_threshold(self.min_support, DEFAULT_MIN_SUPPORT, "minSupport")?;
        let min_confidence =
            validate_threshold(self.min_confidence, DEFAULT_MIN_CONFIDENCE, "minConfidence")?;
        Ok(ValidBasketRequest {
            start,
            end,
            min_support,
            min_confidence,
        })
    }
}

fn validate_forecast_fields(
    period: &str,
    model: &str,
    start: &str,
    end: &str,
) -> Result<ValidForecastRequest, EngineError> {
    let period: ForecastPeriod = period.parse().map_err(EngineError::Validation)?;
    let model: ModelType = model.parse().map_err(EngineError::Validation)?;
    let (start, end) = validate_window(start, end)?;
    Ok(ValidForecastRequest {
        period,
        model,
        start,
        end,
    })
}

fn validate_window(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), EngineError> {
    if start.is_empty() || end.is_empty() {
        return Err(EngineError::Validation(
            "startDate and endDate are required".to_string(),
        ));
    }
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start >= end {
        return Err(EngineError::Validation(
            "startDate must be before endDate".to_string(),
        ));
    }
    Ok((start, end))
}

fn parse_date(raw: &str) -> Result<NaiveDate, EngineError> {
    raw.parse::<NaiveDate>()
        .map_err(|_| EngineError::Validation(format!("invalid date format: {raw}")))
}

fn validate_threshold(value: Option<f64>, default: f64, name: &str) -> Result<f64, EngineError> {
    let value = value.unwrap_or(default);
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::Validation(format!(
            "{name} must be between 0 and 1"
        )));
    }
    Ok(value)
}
