//! Error types for oracle operations.

use thiserror::Error;

/// Errors that can occur while asking the risk oracle about a supplier.
///
/// Every variant means "no new information": callers keep whatever they
/// knew before and never read an error as a stable assessment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// Configuration error (missing API key, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network error reaching the oracle.
    #[error("network error: {0}")]
    Network(String),

    /// The oracle answered with an error status (quota, auth, server error).
    #[error("oracle rejected request: {0}")]
    Rejected(String),

    /// The response could not be turned into an assessment.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The oracle is temporarily unavailable.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}
