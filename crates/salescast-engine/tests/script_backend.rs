//! End-to-end tests of the subprocess backend's output protocol, using
//! `/bin/sh` stub scripts in place of the Python model.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use salescast_core::{ForecastPeriod, ModelType};
use salescast_engine::{
    BasketJob, ForecastJob, GatewayError, ModelBackend, ScriptBackend, ScriptBackendConfig,
};

struct ScriptDir {
    dir: PathBuf,
}

impl ScriptDir {
    /// Create a unique scripts directory with the given forecast and
    /// basket script bodies (interpreted by `sh`).
    fn new(forecast_body: &str, basket_body: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("salescast-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create script dir");
        std::fs::write(dir.join("forecast.py"), forecast_body).expect("write forecast stub");
        std::fs::write(dir.join("market_basket.py"), basket_body).expect("write basket stub");
        Self { dir }
    }

    fn backend(&self, timeout: Duration) -> ScriptBackend {
        ScriptBackend::new(ScriptBackendConfig {
            python_bin: "sh".to_string(),
            scripts_dir: self.dir.clone(),
            forecast_timeout: timeout,
        })
    }
}

impl Drop for ScriptDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn forecast_job() -> ForecastJob {
    ForecastJob {
        dataset_json: "[]".to_string(),
        period: ForecastPeriod::Monthly,
        model: ModelType::Arima,
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    }
}

#[tokio::test]
async fn last_json_line_wins_over_diagnostics() {
    let scripts = ScriptDir::new(
        r#"
echo "Step 0: Script started"
echo '{"predictions": [{"date": "2024-02-01", "predictedSales": 1}]}'
echo "Step 5: refining"
echo '{"predictions": [{"date": "2024-03-01", "predictedSales": 500}], "metrics": {"mape": 10}}'
"#,
        "",
    );
    let backend = scripts.backend(Duration::from_secs(10));

    let value = backend.run_forecast(&forecast_job()).await.unwrap();
    assert_eq!(value["predictions"][0]["date"], "2024-03-01");
    assert_eq!(value["metrics"]["mape"], 10);
}

#[tokio::test]
async fn stderr_error_beats_valid_stdout() {
    let scripts = ScriptDir::new(
        r#"
echo '{"predictions": [{"date": "2024-03-01", "predictedSales": 500}]}'
echo '{"error": "model diverged"}' >&2
exit 1
"#,
        "",
    );
    let backend = scripts.backend(Duration::from_secs(10));

    let error = backend.run_forecast(&forecast_job()).await.unwrap_err();
    assert!(
        matches!(error, GatewayError::Model(ref m) if m == "model diverged"),
        "got: {error:?}"
    );
}

#[tokio::test]
async fn silent_exit_is_empty_output() {
    let scripts = ScriptDir::new("exit 0\n", "");
    let backend = scripts.backend(Duration::from_secs(10));

    let error = backend.run_forecast(&forecast_job()).await.unwrap_err();
    assert!(matches!(error, GatewayError::EmptyOutput));
}

#[tokio::test]
async fn broken_json_is_malformed_with_raw_line() {
    let scripts = ScriptDir::new("echo '{predictions: oops}'\n", "");
    let backend = scripts.backend(Duration::from_secs(10));

    let error = backend.run_forecast(&forecast_job()).await.unwrap_err();
    assert!(
        matches!(error, GatewayError::Malformed { ref raw, .. } if raw == "{predictions: oops}")
    );
}

#[tokio::test]
async fn hung_process_is_killed_on_timeout() {
    let scripts = ScriptDir::new("sleep 30\n", "");
    let backend = scripts.backend(Duration::from_millis(300));

    let started = std::time::Instant::now();
    let error = backend.run_forecast(&forecast_job()).await.unwrap_err();
    assert!(matches!(error, GatewayError::Timeout(_)));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "timeout did not fire promptly"
    );
}

#[tokio::test]
async fn basket_script_receives_positional_thresholds() {
    let scripts = ScriptDir::new(
        "",
        r#"
printf '{"itemsets": [], "rules": [], "echoSupport": %s, "echoConfidence": %s}\n' "$2" "$3"
"#,
    );
    let backend = scripts.backend(Duration::from_secs(10));

    let value = backend
        .run_basket(&BasketJob {
            dataset_json: "[]".to_string(),
            min_support: 0.25,
            min_confidence: 0.6,
        })
        .await
        .unwrap();
    assert_eq!(value["echoSupport"], 0.25);
    assert_eq!(value["echoConfidence"], 0.6);
}
