//! Error types for pronosticar
//!
//! Every fallible operation in the crate returns [`Result`], whose error is
//! [`ForecastError`]. Boot-time failures (dataset, training) are fatal to the
//! process; request-time failures are classified by [`ErrorKind`] and mapped to
//! HTTP statuses by the API layer.

use thiserror::Error;

/// Result type alias for pronosticar operations
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error type for all pronosticar operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    /// Dataset file could not be opened or read
    #[error("Failed to read dataset '{path}': {message}")]
    DatasetUnavailable {
        /// Path that was requested
        path: String,
        /// Underlying I/O message
        message: String,
    },

    /// Dataset header lacks a required column
    #[error("Dataset is missing required column '{column}'")]
    MissingColumn {
        /// Name of the absent column
        column: String,
    },

    /// A dataset row could not be parsed
    #[error("Malformed dataset row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number in the source file (header is line 1)
        line: u64,
        /// What was wrong with the row
        reason: String,
    },

    /// Not enough rows to split into train and test partitions
    #[error("Insufficient data: need at least {required} rows, found {found}")]
    InsufficientData {
        /// Minimum number of rows
        required: usize,
        /// Rows actually present
        found: usize,
    },

    /// Regression model failed to fit or predict
    #[error("Model error during {operation}: {reason}")]
    ModelError {
        /// Operation that failed (fit, predict)
        operation: String,
        /// Library-provided reason
        reason: String,
    },

    /// Request carried an unusable spend value
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },

    /// Forecast arithmetic is degenerate for this prediction
    #[error("Invalid computation: {reason}")]
    InvalidComputation {
        /// Description of the degenerate case
        reason: String,
    },

    /// Chart rendering or encoding failed
    #[error("Render error: {reason}")]
    RenderError {
        /// Why rendering failed
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Coarse classification used for HTTP mapping and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied bad input (4xx)
    InvalidInput,
    /// Prediction produced a degenerate CPA band (4xx)
    InvalidComputation,
    /// Model or renderer failed while serving (5xx)
    Internal,
    /// Startup failure; never produced while serving
    Boot,
}

impl ErrorKind {
    /// Stable lowercase identifier used in error bodies and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::InvalidComputation => "invalid_computation",
            Self::Internal => "internal",
            Self::Boot => "boot",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ForecastError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::InvalidComputation { .. } => ErrorKind::InvalidComputation,
            Self::ModelError { .. } | Self::RenderError { .. } => ErrorKind::Internal,
            Self::DatasetUnavailable { .. }
            | Self::MissingColumn { .. }
            | Self::MalformedRow { .. }
            | Self::InsufficientData { .. }
            | Self::InvalidConfiguration(_) => ErrorKind::Boot,
        }
    }

    /// Shorthand for an [`ForecastError::InvalidInput`]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ForecastError::RenderError`]
    pub fn render(reason: impl Into<String>) -> Self {
        Self::RenderError {
            reason: reason.into(),
        }
    }
}
