//! Production engine wiring.

pub use salescast_db::PgStore;
use salescast_engine::{ForecastEngine, ScriptBackend};

/// The concrete engine wired for production: subprocess model backend,
/// Postgres persistence.
pub type AppEngine = ForecastEngine<ScriptBackend, PgStore>;
