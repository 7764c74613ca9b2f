//! Error type for configuration seams.
//!
//! The computation core never fails on telemetry data: missing or invalid fields
//! resolve to documented defaults. Errors only surface where a caller hands in a
//! structurally invalid configuration.

use thiserror::Error;

/// Result alias for `fleet_twin` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when constructing typed inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Action label is not one of `WAIT`, `REROUTE`, `EXPRESS`.
    #[error("unknown action label: {0:?}")]
    UnknownAction(String),

    /// A decision weight was negative or not finite.
    #[error("invalid weight {name}={value}: weights must be finite and >= 0")]
    InvalidWeight { name: &'static str, value: f64 },

    /// Progress checkpoints were empty, non-finite, or decreasing.
    #[error("invalid checkpoints: {0}")]
    InvalidCheckpoints(String),
}
