//! Error types for the miner and the rule engine.

use thiserror::Error;

/// Result type alias using `AprioriError`.
pub type Result<T> = std::result::Result<T, AprioriError>;

/// Boxed error for failures raised by a `Database` implementation.
pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AprioriError {
    /// A threshold or configuration value is unusable.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// A `Database` answered a support query with the wrong number of counts.
    #[error("SupportCountMismatch: expected {expected} counts, got {got}")]
    SupportCountMismatch { expected: usize, got: usize },

    /// The transaction store failed to answer a query.
    #[error("DatabaseError: {0}")]
    Database(String),

    /// External error from a third-party store.
    #[error("ExternalError: {0}")]
    External(GenericError),
}

impl AprioriError {
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::External(Box::new(err))
    }
}

#[cfg(feature = "python")]
impl From<AprioriError> for pyo3::PyErr {
    fn from(err: AprioriError) -> Self {
        match err {
            AprioriError::InvalidParameter(msg) => pyo3::exceptions::PyValueError::new_err(msg),
            other => pyo3::exceptions::PyRuntimeError::new_err(other.to_string()),
        }
    }
}
