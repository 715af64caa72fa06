//! Forecast generation and market-basket analysis engine.
//!
//! The pipeline for both flows has the same shape: validate the request,
//! load a sufficient historical dataset, invoke the external model
//! computation through the [`gateway::Gateway`], validate/normalize the
//! model output, and persist the structured result through a [`Store`].
//!
//! The external model is an untrusted collaborator: it may crash, hang,
//! or write diagnostic noise around its one authoritative JSON line. The
//! gateway's stream protocol and retry budget exist to extract a single
//! trustworthy payload from that channel.

mod dataset;
mod error;
pub mod gateway;
mod normalize;
mod orchestrator;
mod request;
mod script;
mod store;

pub use dataset::{MIN_SALES_RECORDS, RETRAIN_SAMPLE_LIMIT};
pub use error::{EngineError, GatewayError, OutputError, StoreError};
pub use gateway::{BasketJob, ForecastJob, Gateway, ModelBackend};
pub use normalize::{normalize_basket, normalize_forecast, NormalizedForecast};
pub use orchestrator::ForecastEngine;
pub use request::{BasketRequest, ForecastRequest, RetrainRequest};
pub use script::{ScriptBackend, ScriptBackendConfig};
pub use store::Store;
