mod api;
mod middleware;
mod scheduler;
mod store;

use std::sync::Arc;
use std::time::Duration;

use salescast_engine::{Gateway, ScriptBackend, ScriptBackendConfig};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    store::{AppEngine, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(salescast_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = salescast_db::PoolConfig::from_app_config(&config);
    let pool = salescast_db::connect_pool(&config.database_url, pool_config).await?;
    salescast_db::run_migrations(&pool).await?;

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
    let engine: Arc<AppEngine> = Arc::new(AppEngine::new(gateway, PgStore::new(pool.clone())));

    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&engine), Arc::clone(&config)).await?;

    let app = build_app(AppState { pool, engine });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "salescast-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
