//! Historical-dataset preparation and the sufficiency gate.

use chrono::{Months, NaiveDate};
use salescast_core::SalesRecord;

use crate::error::EngineError;

/// Minimum number of qualifying records before any model invocation.
pub const MIN_SALES_RECORDS: usize = 10;

/// Retraining samples at most this many most-recent records — a
/// deliberately bounded sample rather than the full history.
pub const RETRAIN_SAMPLE_LIMIT: usize = 1000;

/// Start of the historical window: one year before the requested start date.
pub(crate) fn lookback_start(start: NaiveDate) -> NaiveDate {
    start
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}

/// The sufficiency gate. Fewer than [`MIN_SALES_RECORDS`] qualifying
/// records is a client-visible precondition failure, not a system fault.
pub(crate) fn ensure_sufficient(found: usize) -> Result<(), EngineError> {
    if found < MIN_SALES_RECORDS {
        return Err(EngineError::InsufficientData {
            required: MIN_SALES_RECORDS,
            found,
        });
    }
    Ok(())
}

/// Serialize the prepared dataset to the model's JSON input contract.
pub(crate) fn serialize_dataset<T: serde::Serialize>(records: &[T]) -> Result<String, EngineError> {
    Ok(serde_json::to_string(records)?)
}

/// Re-sort a descending most-recent sample into chronological order, as
/// the model consumes an ascending sequence.
pub(crate) fn sort_chronologically(mut records: Vec<SalesRecord>) -> Vec<SalesRecord> {
    records.sort_by_key(|r| r.date);
    records
}
