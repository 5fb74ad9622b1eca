//! Core error types for Kausal.

use thiserror::Error;

/// Result type alias using `KausalError`.
pub type KausalResult<T> = std::result::Result<T, KausalError>;

/// Core error type for Kausal operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KausalError {
    /// Invalid argument supplied by the caller (bad alpha, malformed matrix).
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    /// A statistical test is undefined for its inputs.
    #[error("NumericalError: {0}")]
    NumericalError(String),

    /// Graph structure error (vertex out of range, bad permutation).
    #[error("GraphError: {0}")]
    GraphError(String),

    /// A run exceeded its configured time budget.
    #[error("DeadlineExceeded: {0}")]
    DeadlineExceeded(String),

    /// Internal error (bug in Kausal).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Arrow error raised while ingesting columnar data.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),
}

impl KausalError {
    /// Create a new `InvalidArgument` error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new `NumericalError`.
    pub fn numerical<S: Into<String>>(msg: S) -> Self {
        Self::NumericalError(msg.into())
    }

    /// Create a new `GraphError`.
    pub fn graph<S: Into<String>>(msg: S) -> Self {
        Self::GraphError(msg.into())
    }

    /// Create a new `DeadlineExceeded` error.
    pub fn deadline<S: Into<String>>(msg: S) -> Self {
        Self::DeadlineExceeded(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether this error came from a degenerate statistical test.
    pub const fn is_numerical(&self) -> bool {
        matches!(self, Self::NumericalError(_))
    }

    /// Whether this error was raised by argument validation.
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Ensure a condition holds, returning an `InvalidArgument` error if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::KausalError::$variant(format!($($msg)*)));
        }
    };
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::KausalError::InvalidArgument($msg.to_string()));
        }
    };
}

/// Return early with an `InvalidArgument` error.
#[macro_export]
macro_rules! invalid_arg {
    ($($arg:tt)*) => {
        return Err($crate::KausalError::InvalidArgument(format!($($arg)*)))
    };
}

/// Return early with a `NumericalError`.
#[macro_export]
macro_rules! numerical_err {
    ($($arg:tt)*) => {
        return Err($crate::KausalError::NumericalError(format!($($arg)*)))
    };
}
