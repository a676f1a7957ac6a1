//! # Error Types
//!
//! Structured errors for the queryset pipeline. Validation and lookup failures
//! carry a location path (`["query", "ordering[]", 1]`), a human message and a
//! kind tag so callers can render them as `{"detail": [...]}` payloads.
//! Store failures are wrapped without reinterpretation.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const ERROR_INTEGER: &str = "type_error.integer";
pub const ERROR_FLOAT: &str = "type_error.float";
pub const ERROR_BOOL: &str = "type_error.bool";
pub const ERROR_DATETIME: &str = "value_error.datetime";
pub const ERROR_NOT_GE: &str = "value_error.number.not_ge";
pub const ERROR_NOT_LE: &str = "value_error.number.not_le";
pub const ERROR_VALUE: &str = "value_error";
pub const ERROR_DOES_NOT_EXIST: &str = "does_not_exist";
pub const ERROR_PERMISSION_DENIED: &str = "permission_denied";
pub const ERROR_NOT_UNIQUE: &str = "not_unique";

/// One segment of an error location path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for LocSegment {
    fn from(value: &str) -> Self {
        LocSegment::Key(value.to_string())
    }
}

impl From<String> for LocSegment {
    fn from(value: String) -> Self {
        LocSegment::Key(value)
    }
}

impl From<usize> for LocSegment {
    fn from(value: usize) -> Self {
        LocSegment::Index(value)
    }
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocSegment::Key(key) => write!(f, "{key}"),
            LocSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A single located validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationError {
    pub fn new(loc: Vec<LocSegment>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Location rendered with `.` separators, e.g. `query.ordering[].1`
    pub fn location(&self) -> String {
        self.loc
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.location(), self.msg, self.kind)
    }
}

/// Failures raised by the backing store. These are never retried or
/// reinterpreted by the pipeline.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Invalid or unloadable configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum QuerysetError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("Not found: {0}")]
    NotFound(ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Transport payload for validation and lookup failures
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub detail: Vec<ValidationError>,
}

impl QuerysetError {
    /// Single located validation failure
    pub fn validation(
        loc: Vec<LocSegment>,
        msg: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::Validation(vec![ValidationError::new(loc, msg, kind)])
    }

    pub fn not_found(loc: Vec<LocSegment>, msg: impl Into<String>) -> Self {
        Self::NotFound(ValidationError::new(loc, msg, ERROR_VALUE))
    }

    /// HTTP status a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            QuerysetError::Validation(_) => 422,
            QuerysetError::NotFound(_) => 404,
            QuerysetError::Store(_) | QuerysetError::Configuration(_) => 500,
        }
    }

    /// Located details, empty for store and configuration failures
    pub fn details(&self) -> Vec<ValidationError> {
        match self {
            QuerysetError::Validation(errors) => errors.clone(),
            QuerysetError::NotFound(error) => vec![error.clone()],
            QuerysetError::Store(_) | QuerysetError::Configuration(_) => Vec::new(),
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            detail: self.details(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuerysetError>;

/// Build a location path from heterogeneous segments
#[macro_export]
macro_rules! loc {
    ($($segment:expr),* $(,)?) => {
        vec![$($crate::error::LocSegment::from($segment)),*]
    };
}
