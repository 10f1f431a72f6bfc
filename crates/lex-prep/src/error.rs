//! Error types for the preprocessing pipeline.
//!
//! Every failure the pipeline can report is a variant of [`PrepError`].
//! Variants fall into a small number of [`ErrorKind`]s so that callers (the
//! CLI, or a UI collaborator) can decide how to present them without matching
//! on every variant.
//!
//! Errors are serializable as `{ "code": ..., "message": ... }` so they can be
//! forwarded to a frontend unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Broad classification of a [`PrepError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A column reference or role assignment does not fit the dataset.
    Configuration,
    /// A strategy or method name was not recognized.
    UnsupportedStrategy,
    /// The dataset has no rows or no columns.
    EmptyInput,
    /// The data itself could not be processed (parse failures, unseen categories).
    Data,
    /// Reading or writing files failed.
    Io,
}

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PrepError {
    /// A configuration value references a column the dataset does not have.
    #[error("Column '{column}' referenced by {referenced_by} not found in dataset")]
    UnknownColumn {
        column: String,
        referenced_by: String,
    },

    /// A column was used in a role it was not declared for.
    #[error("Column '{column}' must be in the {expected} role to be used for {operation}")]
    RoleMismatch {
        column: String,
        expected: String,
        operation: String,
    },

    /// Any other invalid configuration (overlapping roles, name collisions...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unrecognized strategy or method name.
    #[error("Unsupported {kind} '{value}' (expected one of: {expected})")]
    UnsupportedStrategy {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The dataset has zero rows or zero columns.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A fitted label encoder met a category it never saw during fitting.
    #[error("Column '{column}' contains category '{value}' unseen during fitting")]
    UnknownCategory { column: String, value: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Shorthand for [`PrepError::UnknownColumn`].
    pub fn unknown_column(column: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownColumn { .. } | Self::RoleMismatch { .. } | Self::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            Self::UnsupportedStrategy { .. } => ErrorKind::UnsupportedStrategy,
            Self::EmptyInput(_) => ErrorKind::EmptyInput,
            Self::UnknownCategory { .. } | Self::Polars(_) | Self::Json(_) => ErrorKind::Data,
            Self::Io(_) => ErrorKind::Io,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownColumn { .. } | Self::RoleMismatch { .. } | Self::InvalidConfig(_) => {
                "CONFIGURATION_ERROR"
            }
            Self::UnsupportedStrategy { .. } => "UNSUPPORTED_STRATEGY",
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error can be fixed by changing the configuration and re-running.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::UnsupportedStrategy
        )
    }
}

impl Serialize for PrepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PrepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}
