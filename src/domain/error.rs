use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    /// The uploaded bytes are not a readable CSV or spreadsheet.
    FormatError(String),
    /// A column the operation needs is absent from the table.
    SchemaError(String),
    /// Anomaly detection preconditions are not met.
    InsufficientData(String),
    Unauthorized(String),
    DatabaseError(String),
    ConfigError(String),
    IoError(String),
}

impl AppError {
    /// Stable machine-readable name used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::ValidationError(_) => "validation_error",
            AppError::FormatError(_) => "format_error",
            AppError::SchemaError(_) => "schema_error",
            AppError::InsufficientData(_) => "insufficient_data",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::DatabaseError(_) => "database_error",
            AppError::ConfigError(_) => "config_error",
            AppError::IoError(_) => "io_error",
        }
    }

    pub fn missing_column(column: &str) -> Self {
        AppError::SchemaError(format!("required column '{}' is missing", column))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::FormatError(msg) => write!(f, "Bad file: {}", msg),
            AppError::SchemaError(msg) => write!(f, "Missing column: {}", msg),
            AppError::InsufficientData(msg) => {
                write!(f, "Not enough data for anomaly detection: {}", msg)
            }
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::FormatError(format!("CSV: {}", err))
    }
}

impl From<calamine::Error> for AppError {
    fn from(err: calamine::Error) -> Self {
        AppError::FormatError(format!("spreadsheet: {}", err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
