//! Error types for mts-dml

use thiserror::Error;

/// Result type alias for mts-dml operations
pub type MtsResult<T> = Result<T, MtsError>;

/// Error types for SQL building, configuration and query execution
#[derive(Debug, Error)]
pub enum MtsError {
    /// No dialect configured on a builder that needs one
    #[error("Configuration error: no SQL dialect configured")]
    DialectNotSet,

    /// Dialect name that has no pagination strategy
    #[error("Unsupported SQL dialect: {0}")]
    UnsupportedDialect(String),

    /// Logical sort field without a configured ORDER BY fragment
    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    /// Invalid argument (negative offset, malformed fragment, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration file could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row or named resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Migration error
    #[cfg(feature = "migrate")]
    #[error("Migration error: {0}")]
    Migration(String),
}

impl MtsError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether this error stems from builder/dialect misconfiguration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DialectNotSet | Self::UnsupportedDialect(_) | Self::Config(_)
        )
    }

    /// Check if this is an unknown sort field error
    pub fn is_unknown_sort_field(&self) -> bool {
        matches!(self, Self::UnknownSortField(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for MtsError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(feature = "migrate")]
impl From<refinery::Error> for MtsError {
    fn from(err: refinery::Error) -> Self {
        Self::Migration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        assert!(MtsError::DialectNotSet.is_configuration());
        assert!(MtsError::UnsupportedDialect("db2".into()).is_configuration());
        assert!(!MtsError::UnknownSortField("name".into()).is_configuration());
    }

    #[test]
    fn display_includes_detail() {
        let err = MtsError::UnknownSortField("nickname".into());
        assert_eq!(err.to_string(), "Unknown sort field: nickname");
        assert!(err.is_unknown_sort_field());
    }
}
