use thiserror::Error;

/// A single model-invocation failure, before any retry policy is applied.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model process timed out after {0} seconds")]
    Timeout(u64),

    #[error("empty response from model process")]
    EmptyOutput,

    #[error("invalid model output format: {reason}; output: {raw}")]
    Malformed { reason: String, raw: String },

    /// The model explicitly reported failure, on either stream.
    #[error("{0}")]
    Model(String),

    #[error("failed to run model process: {0}")]
    Process(#[from] std::io::Error),
}

/// A contract violation in an otherwise well-formed model payload.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("model returned empty or missing predictions")]
    EmptyPredictions,

    #[error("invalid prediction date: {0}")]
    InvalidPredictionDate(String),

    #[error("market basket output did not match the expected shape: {0}")]
    BasketShape(String),
}

/// Failure reported by the persistence layer.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Top-level error taxonomy for both orchestrators.
///
/// `Validation` and `InsufficientData` are client-caused: they carry a
/// specific, actionable message and are never retried or logged as system
/// faults. The remaining variants are server-side and surface a generic
/// message upstream while full detail goes to the log.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("at least {required} sales records are required, found {found}")]
    InsufficientData { required: usize, found: usize },

    /// The gateway's retry budget is exhausted; carries the final attempt's error.
    #[error("model invocation failed: {0}")]
    Model(#[from] GatewayError),

    #[error("invalid model output: {0}")]
    InvalidOutput(#[from] OutputError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this failure was caused by the client's input rather than
    /// the system, i.e. it maps to a 4xx-equivalent response.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::InsufficientData { .. }
        )
    }
}
