//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! weekly retraining sweep.

use std::sync::Arc;

use chrono::{Months, Utc};
use salescast_engine::{RetrainRequest, MIN_SALES_RECORDS};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::store::AppEngine;

/// Builds and starts the background job scheduler.
///
/// Registers the recurring retraining sweep and starts the scheduler.
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    engine: Arc<AppEngine>,
    config: Arc<salescast_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_retrain_job(&scheduler, pool, engine, &config.retrain_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring retraining sweep.
///
/// By default runs every Sunday at 00:00 UTC (`0 0 0 * * SUN`). The sweep
/// retrains a default monthly forecast for every owner that has enough
/// sales history in the past year to clear the sufficiency gate.
async fn register_retrain_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    engine: Arc<AppEngine>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let engine = Arc::clone(&engine);

        Box::pin(async move {
            tracing::info!("scheduler: starting retraining sweep");
            run_retrain_sweep(&pool, &engine).await;
            tracing::info!("scheduler: retraining sweep complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one retraining pass over all eligible owners.
///
/// A failure for one owner is logged and never aborts the sweep.
async fn run_retrain_sweep(pool: &PgPool, engine: &AppEngine) {
    let today = Utc::now().date_naive();
    let since = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(chrono::NaiveDate::MIN);
    let horizon_end = today
        .checked_add_months(Months::new(3))
        .unwrap_or(chrono::NaiveDate::MAX);
    let min_sales = i64::try_from(MIN_SALES_RECORDS).unwrap_or(i64::MAX);

    let owners = match salescast_db::list_owners_with_min_sales(pool, since, min_sales).await {
        Ok(owners) => owners,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to list eligible owners");
            return;
        }
    };

    if owners.is_empty() {
        tracing::info!("scheduler: no owners with enough sales history; skipping");
        return;
    }

    tracing::info!(count = owners.len(), "scheduler: retraining owners");

    // Defaults apply: Monthly period, RandomForest model, quarter-ahead
    // horizon starting today.
    let request = RetrainRequest {
        forecast_period: None,
        model_type: None,
        start_date: today.to_string(),
        end_date: horizon_end.to_string(),
    };
    for owner_id in owners {
        match engine.retrain_forecast(owner_id, &request).await {
            Ok(result) => {
                tracing::info!(
                    owner_id = %owner_id,
                    predictions = result.predictions.len(),
                    alert = result.alert.is_active,
                    "scheduler: owner retrained"
                );
            }
            Err(e) => {
                tracing::error!(owner_id = %owner_id, error = %e, "scheduler: owner retrain failed");
            }
        }
    }
}
