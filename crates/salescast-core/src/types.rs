//! Shared domain types for the forecasting and market-basket pipelines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MAPE percentage above which a forecast carries an active accuracy alert.
pub const ALERT_MAPE_THRESHOLD: f64 = 20.0;

/// Message attached to an active accuracy alert.
pub const ALERT_MESSAGE: &str = "High prediction error";

/// Granularity of predicted time buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastPeriod::Daily => write!(f, "Daily"),
            ForecastPeriod::Weekly => write!(f, "Weekly"),
            ForecastPeriod::Monthly => write!(f, "Monthly"),
        }
    }
}

impl std::str::FromStr for ForecastPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Daily" => Ok(ForecastPeriod::Daily),
            "Weekly" => Ok(ForecastPeriod::Weekly),
            "Monthly" => Ok(ForecastPeriod::Monthly),
            other => Err(format!("invalid forecast period: {other}")),
        }
    }
}

/// The statistical/ML model the external computation should fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "ARIMA")]
    Arima,
    RandomForest,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Arima => write!(f, "ARIMA"),
            ModelType::RandomForest => write!(f, "RandomForest"),
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARIMA" => Ok(ModelType::Arima),
            "RandomForest" => Ok(ModelType::RandomForest),
            other => Err(format!("invalid model type: {other}")),
        }
    }
}

/// A single historical sales observation, projected to the feature set the
/// forecasting model consumes. Serialized field names match the model's
/// JSON input contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub total_amount: f64,
    pub promotion: bool,
}

/// One line item of a sale, as fed to the basket-mining model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: f64,
}

/// A full sale document with its line items, the transaction unit of
/// market-basket analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithItems {
    pub date: NaiveDate,
    pub total_amount: f64,
    pub promotion: bool,
    pub items: Vec<SaleItem>,
}

/// One predicted time bucket with its confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub confidence_level: f64,
    pub confidence_upper: f64,
    pub confidence_lower: f64,
}

/// Feature summary reported by the model alongside its predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastFeatures {
    pub seasonality: String,
    pub promotion: bool,
    pub lagged_sales: f64,
    pub economic_trend: String,
}

impl Default for ForecastFeatures {
    fn default() -> Self {
        Self {
            seasonality: "None".to_string(),
            promotion: false,
            lagged_sales: 0.0,
            economic_trend: "Stable".to_string(),
        }
    }
}

/// Accuracy metrics reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
}

/// Derived accuracy alert. `is_active` holds exactly when the forecast's
/// MAPE exceeds [`ALERT_MAPE_THRESHOLD`]; `message` is non-empty iff active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastAlert {
    pub is_active: bool,
    pub message: String,
}

impl ForecastAlert {
    /// Derive the alert from a MAPE value.
    #[must_use]
    pub fn from_mape(mape: f64) -> Self {
        let is_active = mape > ALERT_MAPE_THRESHOLD;
        Self {
            is_active,
            message: if is_active {
                ALERT_MESSAGE.to_string()
            } else {
                String::new()
            },
        }
    }
}

/// A complete forecast, owned by one user. Created only after validation,
/// sufficiency, model invocation and normalization have all succeeded;
/// immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub owner_id: Uuid,
    pub predictions: Vec<Prediction>,
    pub forecast_period: ForecastPeriod,
    pub model_type: ModelType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub features: ForecastFeatures,
    pub metrics: ForecastMetrics,
    pub alert: ForecastAlert,
}

/// A set of products observed to co-occur above the support threshold.
/// Items are the model's product references, kept as opaque strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    pub items: Vec<String>,
    pub support: f64,
}

/// An antecedents ⇒ consequents implication with confidence and lift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub confidence: f64,
    pub lift: f64,
}

/// A complete market-basket analysis, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBasketResult {
    pub owner_id: Uuid,
    pub analysis_date: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_support: f64,
    pub min_confidence: f64,
    pub itemsets: Vec<Itemset>,
    pub rules: Vec<AssociationRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_period_round_trips_through_strings() {
        for (s, p) in [
            ("Daily", ForecastPeriod::Daily),
            ("Weekly", ForecastPeriod::Weekly),
            ("Monthly", ForecastPeriod::Monthly),
        ] {
            assert_eq!(s.parse::<ForecastPeriod>().unwrap(), p);
            assert_eq!(p.to_string(), s);
        }
        assert!("daily".parse::<ForecastPeriod>().is_err());
    }

    #[test]
    fn model_type_serializes_with_original_names() {
        assert_eq!(
            serde_json::to_string(&ModelType::Arima).unwrap(),
            r#""ARIMA""#
        );
        assert_eq!(
            serde_json::to_string(&ModelType::RandomForest).unwrap(),
            r#""RandomForest""#
        );
        assert_eq!("ARIMA".parse::<ModelType>().unwrap(), ModelType::Arima);
    }

    #[test]
    fn sales_record_uses_camel_case_wire_names() {
        let record = SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total_amount: 150.5,
            promotion: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["totalAmount"], 150.5);
        assert_eq!(json["promotion"], true);
    }

    #[test]
    fn alert_derivation_matches_threshold() {
        let active = ForecastAlert::from_mape(25.0);
        assert!(active.is_active);
        assert_eq!(active.message, ALERT_MESSAGE);

        let inactive = ForecastAlert::from_mape(15.0);
        assert!(!inactive.is_active);
        assert!(inactive.message.is_empty());

        // Threshold itself does not trigger.
        assert!(!ForecastAlert::from_mape(20.0).is_active);
    }

    #[test]
    fn features_default_to_declared_values() {
        let features = ForecastFeatures::default();
        assert_eq!(features.seasonality, "None");
        assert_eq!(features.economic_trend, "Stable");
        assert!(!features.promotion);
        assert_eq!(features.lagged_sales, 0.0);
    }
}
