//! Validation and normalization of raw model output.
//!
//! The model payload is duck-typed JSON; this module re-expresses the
//! field-by-field coercion as an explicit schema with defaulting rules.
//! Missing optional fields never fail; missing required ones (the
//! predictions array, each prediction's date) always do.

use chrono::NaiveDate;
use salescast_core::{
    AssociationRule, ForecastAlert, ForecastFeatures, ForecastMetrics, Itemset, Prediction,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::OutputError;

/// A fully normalized forecast payload, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedForecast {
    pub predictions: Vec<Prediction>,
    pub features: ForecastFeatures,
    pub metrics: ForecastMetrics,
    pub alert: ForecastAlert,
}

/// Normalize a raw forecasting payload.
///
/// # Errors
///
/// Returns [`OutputError::EmptyPredictions`] if `predictions` is missing,
/// not an array, or empty, and [`OutputError::InvalidPredictionDate`] if
/// any prediction's date fails to parse — fatal for the whole result, not
/// skippable per item.
pub fn normalize_forecast(raw: &Value) -> Result<NormalizedForecast, OutputError> {
    let raw_predictions = raw
        .get("predictions")
        .and_then(Value::as_array)
        .filter(|p| !p.is_empty())
        .ok_or(OutputError::EmptyPredictions)?;

    let predictions = raw_predictions
        .iter()
        .map(normalize_prediction)
        .collect::<Result<Vec<_>, _>>()?;

    let features = normalize_features(raw.get("features"));
    let metrics = normalize_metrics(raw.get("metrics"));
    let alert = ForecastAlert::from_mape(metrics.mape);

    Ok(NormalizedForecast {
        predictions,
        features,
        metrics,
        alert,
    })
}

fn normalize_prediction(raw: &Value) -> Result<Prediction, OutputError> {
    let date = parse_prediction_date(raw.get("date"))?;

    let predicted_sales = number(raw.get("predictedSales")).unwrap_or(0.0).max(0.0);
    let confidence_level = number(raw.get("confidenceLevel"))
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);

    // Synthetic ±10% band around the point estimate when the model did not
    // report bounds of its own.
    let confidence_upper = number(raw.get("confidenceUpper"))
        .unwrap_or(predicted_sales * 1.1)
        .max(0.0);
    let confidence_lower = number(raw.get("confidenceLower"))
        .unwrap_or(predicted_sales * 0.9)
        .max(0.0);

    Ok(Prediction {
        date,
        predicted_sales,
        confidence_level,
        confidence_upper,
        confidence_lower,
    })
}

fn parse_prediction_date(raw: Option<&Value>) -> Result<NaiveDate, OutputError> {
    let invalid = || OutputError::InvalidPredictionDate(render(raw));
    let text = raw.and_then(Value::as_str).ok_or_else(invalid)?;
    // Calendar dates, with an RFC 3339 timestamp fallback for models that
    // emit full datetimes.
    text.parse::<NaiveDate>()
        .or_else(|_| {
            chrono::DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive())
        })
        .map_err(|_| invalid())
}

fn normalize_features(raw: Option<&Value>) -> ForecastFeatures {
    let defaults = ForecastFeatures::default();
    let Some(raw) = raw else { return defaults };
    ForecastFeatures {
        seasonality: string(raw.get("seasonality")).unwrap_or(defaults.seasonality),
        promotion: raw
            .get("promotion")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.promotion),
        lagged_sales: number(raw.get("laggedSales"))
            .unwrap_or(defaults.lagged_sales)
            .max(0.0),
        economic_trend: string(raw.get("economicTrend")).unwrap_or(defaults.economic_trend),
    }
}

fn normalize_metrics(raw: Option<&Value>) -> ForecastMetrics {
    let Some(raw) = raw else {
        return ForecastMetrics::default();
    };
    ForecastMetrics {
        rmse: number(raw.get("rmse")).unwrap_or(0.0).max(0.0),
        mae: number(raw.get("mae")).unwrap_or(0.0).max(0.0),
        mape: number(raw.get("mape")).unwrap_or(0.0).max(0.0),
    }
}

fn number(raw: Option<&Value>) -> Option<f64> {
    raw.and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn string(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str).map(str::to_string)
}

fn render(raw: Option<&Value>) -> String {
    raw.map_or_else(|| "missing".to_string(), Value::to_string)
}

#[derive(Debug, Deserialize)]
struct RawBasketOutput {
    itemsets: Vec<Itemset>,
    rules: Vec<AssociationRule>,
}

/// Parse a raw basket-mining payload into itemsets and rules.
///
/// The structured parse is the only validation: once the shape matches,
/// the result is accepted as-is. Antecedent/consequent disjointness is
/// trusted input — violations are warn-logged, not rejected.
///
/// # Errors
///
/// Returns [`OutputError::BasketShape`] if the payload does not match the
/// itemsets/rules shape.
pub fn normalize_basket(raw: Value) -> Result<(Vec<Itemset>, Vec<AssociationRule>), OutputError> {
    let output: RawBasketOutput =
        serde_json::from_value(raw).map_err(|e| OutputError::BasketShape(e.to_string()))?;

    for rule in &output.rules {
        if rule
            .antecedents
            .iter()
            .any(|item| rule.consequents.contains(item))
        {
            tracing::warn!(
                antecedents = ?rule.antecedents,
                consequents = ?rule.consequents,
                "association rule has overlapping antecedents and consequents"
            );
        }
    }

    Ok((output.itemsets, output.rules))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn derives_default_confidence_band() {
        let raw = json!({
            "predictions": [{"date": "2024-03-01", "predictedSales": 100}]
        });
        let normalized = normalize_forecast(&raw).unwrap();
        let prediction = &normalized.predictions[0];
        assert_eq!(prediction.predicted_sales, 100.0);
        assert!((prediction.confidence_upper - 110.0).abs() < 1e-9);
        assert!((prediction.confidence_lower - 90.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_model_reported_band() {
        let raw = json!({
            "predictions": [{
                "date": "2024-03-01",
                "predictedSales": 100,
                "confidenceUpper": 130,
                "confidenceLower": 70,
                "confidenceLevel": 95
            }]
        });
        let prediction = &normalize_forecast(&raw).unwrap().predictions[0];
        assert_eq!(prediction.confidence_upper, 130.0);
        assert_eq!(prediction.confidence_lower, 70.0);
        assert_eq!(prediction.confidence_level, 95.0);
    }

    #[test]
    fn coerces_missing_numbers_to_zero() {
        let raw = json!({
            "predictions": [{"date": "2024-03-01", "predictedSales": "lots"}]
        });
        let prediction = &normalize_forecast(&raw).unwrap().predictions[0];
        assert_eq!(prediction.predicted_sales, 0.0);
        assert_eq!(prediction.confidence_level, 0.0);
        assert_eq!(prediction.confidence_upper, 0.0);
        assert_eq!(prediction.confidence_lower, 0.0);
    }

    #[test]
    fn empty_or_missing_predictions_are_fatal() {
        assert!(matches!(
            normalize_forecast(&json!({"predictions": []})),
            Err(OutputError::EmptyPredictions)
        ));
        assert!(matches!(
            normalize_forecast(&json!({"metrics": {"mape": 5}})),
            Err(OutputError::EmptyPredictions)
        ));
        assert!(matches!(
            normalize_forecast(&json!({"predictions": "soon"})),
            Err(OutputError::EmptyPredictions)
        ));
    }

    #[test]
    fn invalid_prediction_date_fails_the_whole_result() {
        let raw = json!({
            "predictions": [
                {"date": "2024-03-01", "predictedSales": 10},
                {"date": "not-a-date", "predictedSales": 20}
            ]
        });
        let error = normalize_forecast(&raw).unwrap_err();
        assert!(
            matches!(error, OutputError::InvalidPredictionDate(ref raw) if raw.contains("not-a-date"))
        );
    }

    #[test]
    fn accepts_rfc3339_prediction_dates() {
        let raw = json!({
            "predictions": [{"date": "2024-03-01T00:00:00Z", "predictedSales": 10}]
        });
        let prediction = &normalize_forecast(&raw).unwrap().predictions[0];
        assert_eq!(
            prediction.date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn features_and_metrics_default_when_absent() {
        let raw = json!({
            "predictions": [{"date": "2024-03-01", "predictedSales": 10}]
        });
        let normalized = normalize_forecast(&raw).unwrap();
        assert_eq!(normalized.features, ForecastFeatures::default());
        assert_eq!(normalized.metrics, ForecastMetrics::default());
        assert!(!normalized.alert.is_active);
        assert!(normalized.alert.message.is_empty());
    }

    #[test]
    fn alert_activates_above_mape_threshold() {
        let raw = json!({
            "predictions": [{"date": "2024-03-01", "predictedSales": 10}],
            "metrics": {"mape": 25, "rmse": 3.5, "mae": 2.1}
        });
        let normalized = normalize_forecast(&raw).unwrap();
        assert!(normalized.alert.is_active);
        assert_eq!(normalized.alert.message, "High prediction error");
        assert_eq!(normalized.metrics.mape, 25.0);

        let raw = json!({
            "predictions": [{"date": "2024-03-01", "predictedSales": 10}],
            "metrics": {"mape": 15}
        });
        let normalized = normalize_forecast(&raw).unwrap();
        assert!(!normalized.alert.is_active);
        assert_eq!(normalized.alert.message, "");
    }

    #[test]
    fn negative_point_estimates_clamp_to_zero() {
        let raw = json!({
            "predictions": [{"date": "2024-03-01", "predictedSales": -50}]
        });
        let prediction = &normalize_forecast(&raw).unwrap().predictions[0];
        assert_eq!(prediction.predicted_sales, 0.0);
    }

    #[test]
    fn basket_output_parses_as_is() {
        let raw = json!({
            "itemsets": [{"items": ["a", "b"], "support": 0.2}],
            "rules": [{
                "antecedents": ["a"],
                "consequents": ["b"],
                "confidence": 0.8,
                "lift": 1.5
            }]
        });
        let (itemsets, rules) = normalize_basket(raw).unwrap();
        assert_eq!(itemsets.len(), 1);
        assert_eq!(itemsets[0].support, 0.2);
        assert_eq!(rules[0].lift, 1.5);
    }

    #[test]
    fn basket_shape_mismatch_is_rejected() {
        let error = normalize_basket(json!({"itemsets": "none"})).unwrap_err();
        assert!(matches!(error, OutputError::BasketShape(_)));
    }
}
