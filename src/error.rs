//! Typed errors for the distribution-fitting pipeline.

use thiserror::Error;

/// Domain errors raised while preparing samples and fitting distributions.
///
/// `UnknownDistribution` is a configuration error and fatal. `EmptySample`
/// and `ConstantSample` are per-stop errors; a multi-stop run reports them
/// and moves on. `FitFailure` is isolated to a single candidate distribution
/// and never aborts the ranking for a stop.
#[derive(Error, Debug)]
pub enum FitError {
    #[error("distribution `{0}` not found in the discrete or continuous catalog")]
    UnknownDistribution(String),

    #[error("no arrival rows matched stop id {stop_id}")]
    EmptySample { stop_id: i64 },

    #[error("all {count} arrival rows for stop id {stop_id} carry the same value, cannot standardize")]
    ConstantSample { stop_id: i64, count: usize },

    #[error("could not fit `{family}`: {reason}")]
    FitFailure { family: &'static str, reason: String },
}
