//! Error types for the native bridge.

use thiserror::Error;

/// Errors raised while registering owners or configuring the runtime.
///
/// Dispatch itself never fails with an error; it reports a
/// [`DispatchOutcome`](crate::DispatchOutcome) instead, since its caller is a
/// device-library thread with nowhere to send one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// The runtime was shut down; it is never reconstructed.
    #[error("Native runtime has been finalized")]
    Finalized,

    /// No free slot left in the owner handle table.
    #[error("Owner handle table is full (capacity {capacity})")]
    TableFull {
        /// Configured capacity.
        capacity: usize,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl NativeError {
    /// Create a table full error.
    #[must_use]
    pub fn table_full(capacity: usize) -> Self {
        Self::TableFull { capacity }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Whether retrying later can succeed (a slot may be released meanwhile).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TableFull { .. })
    }
}

/// A specialized `Result` type for native bridge operations.
pub type NativeResult<T> = std::result::Result<T, NativeError>;
