use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Interpreter used to launch the model scripts.
    pub model_python_bin: String,
    /// Directory holding `forecast.py` and `market_basket.py`.
    pub model_scripts_dir: PathBuf,
    /// Hard timeout for one forecasting invocation.
    pub forecast_timeout_secs: u64,
    /// Total forecasting attempts (first try plus retries).
    pub forecast_max_attempts: u32,
    /// Linear backoff unit between forecasting attempts.
    pub forecast_retry_backoff_ms: u64,
    /// Cron expression for the weekly retraining job.
    pub retrain_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("model_python_bin", &self.model_python_bin)
            .field("model_scripts_dir", &self.model_scripts_dir)
            .field("forecast_timeout_secs", &self.forecast_timeout_secs)
            .field("forecast_max_attempts", &self.forecast_max_attempts)
            .field(
                "forecast_retry_backoff_ms",
                &self.forecast_retry_backoff_ms,
            )
            .field("retrain_cron", &self.retrain_cron)
            .finish()
    }
}
