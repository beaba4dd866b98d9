//! Error types for refresh and dashboard operations.

use std::time::Duration;

use risk_core::OracleError;
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur while refreshing or driving the dashboard.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The oracle failed or returned something unusable.
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// The oracle did not answer within the configured deadline.
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// No supplier is registered under this id.
    #[error("unknown supplier: {0}")]
    UnknownSupplier(String),

    /// The user is signed out.
    #[error("not signed in")]
    NotAuthenticated,

    /// No company profile has been set, so there is no reference location.
    #[error("company profile not set")]
    MissingCompany,

    /// A command argument was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persisting a change failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
