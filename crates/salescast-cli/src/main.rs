//! Command line interface for running forecasts, basket analyses, and
//! migrations without the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use salescast_db::PgStore;
use salescast_engine::{
    BasketRequest, ForecastEngine, ForecastRequest, Gateway, ScriptBackend, ScriptBackendConfig,
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "salescast-cli")]
#[command(about = "Salescast command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a forecast for an owner and print the result as JSON
    Forecast {
        /// Owner UUID
        #[arg(long)]
        owner: Uuid,
        /// Forecast period (Daily, Weekly, Monthly)
        #[arg(long)]
        period: String,
        /// Model type (ARIMA, RandomForest)
        #[arg(long)]
        model: String,
        /// Forecast window start (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Forecast window end (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },
    /// Run a market-basket analysis for an owner and print the result
    Basket {
        /// Owner UUID
        #[arg(long)]
        owner: Uuid,
        /// Analysis window start (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Analysis window end (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// Minimum itemset support, between 0 and 1
        #[arg(long)]
        min_support: Option<f64>,
        /// Minimum rule confidence, between 0 and 1
        #[arg(long)]
        min_confidence: Option<f64>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Arc::new(salescast_core::load_app_config()?);
    let pool_config = salescast_db::PoolConfig::from_app_config(&config);
    let pool = salescast_db::connect_pool(&config.database_url, pool_config).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Forecast {
            owner,
            period,
            model,
            start,
            end,
        } => {
            let engine = build_engine(&config, pool);
            let request = ForecastRequest {
                forecast_period: period,
                model_type: model,
                start_date: start,
                end_date: end,
            };
            let result = engine.generate_forecast(owner, &request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Basket {
            owner,
            start,
            end,
            min_support,
            min_confidence,
        } => {
            let engine = build_engine(&config, pool);
            let request = BasketRequest {
                start_date: start,
                end_date: end,
                min_support,
                min_confidence,
            };
            let result = engine.generate_market_basket(owner, &request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Migrate => {
            salescast_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
    }

    Ok(())
}

fn build_engine(
    config: &salescast_core::AppConfig,
    pool: sqlx::PgPool,
) -> ForecastEngine<ScriptBackend, PgStore> {
    let backend = ScriptBackend::new(ScriptBackendConfig {
        python_bin: config.model_python_bin.clone(),
        scripts_dir: config.model_scripts_dir.clone(),
        forecast_timeout: Duration::from_secs(config.forecast_timeout_secs),
    });
    let gateway = Gateway::new(
        backend,
        config.forecast_max_attempts,
        Duration::from_millis(config.forecast_retry_backoff_ms),
    );
    ForecastEngine::new(gateway, PgStore::new(pool))
}
