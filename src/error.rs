//! Error types for sqltest.
//!
//! All variants use `thiserror`. The fallible `try_*` entry points return
//! them as values; the test-facing entry points turn them into a failure of
//! the calling test (see [`fail`]).

use thiserror::Error;

use crate::config::ConfigField;

#[derive(Error, Debug)]
pub enum SqlTestError {
    #[error("need environment variable {var:?} (with a {field})")]
    MissingEnvVar { var: String, field: ConfigField },

    /// `data_source` has its password masked.
    #[error("{data_source:?} on unknown driver {driver:?}")]
    UnknownDriver { driver: String, data_source: String },

    /// `data_source` has its password masked.
    #[error("{data_source:?} on {driver:?} unavailable: {message}")]
    Connection {
        driver: String,
        data_source: String,
        message: String,
    },

    #[error("transaction launch: {message}")]
    Begin { message: String },

    #[error("automatic rollback of transaction {transaction_id}: {message}")]
    Rollback {
        transaction_id: String,
        message: String,
    },
}

impl SqlTestError {
    /// Create a missing environment variable error.
    pub fn missing_env_var(var: impl Into<String>, field: ConfigField) -> Self {
        Self::MissingEnvVar {
            var: var.into(),
            field,
        }
    }

    /// Create an unknown driver error. Pass the data source already masked.
    pub fn unknown_driver(driver: impl Into<String>, data_source: impl Into<String>) -> Self {
        Self::UnknownDriver {
            driver: driver.into(),
            data_source: data_source.into(),
        }
    }

    /// Create a connection error. Pass the data source already masked.
    pub fn connection(
        driver: impl Into<String>,
        data_source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Connection {
            driver: driver.into(),
            data_source: data_source.into(),
            message: message.into(),
        }
    }

    /// Create a transaction-begin error.
    pub fn begin(message: impl std::fmt::Display) -> Self {
        Self::Begin {
            message: message.to_string(),
        }
    }

    /// Create a rollback error.
    pub fn rollback(transaction_id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Rollback {
            transaction_id: transaction_id.into(),
            message: message.to_string(),
        }
    }

    /// Get a hint for fixing the test environment, if one applies.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingEnvVar { .. } => {
                Some("Export the variable, or configure a direct value as fallback")
            }
            Self::UnknownDriver { .. } => {
                Some("Use one of: postgres, pg, postgresql, pgx, mysql, mariadb, sqlite, sqlite3")
            }
            Self::Connection { .. } => {
                Some("Check that the database is running and the connect string is valid")
            }
            _ => None,
        }
    }

    /// Whether this error aborts the calling test.
    ///
    /// Rollback failures happen at cleanup time; they mark the test failed
    /// but never cut other cleanup short.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rollback { .. })
    }
}

/// Result type alias for sqltest operations.
pub type SqlTestResult<T> = Result<T, SqlTestError>;

/// Fail the calling test with `err`.
///
/// Rust tests report failure by panicking; the panic aborts only the test
/// thread that owns the error, never the whole test binary.
pub(crate) fn fail(err: SqlTestError) -> ! {
    match err.suggestion() {
        Some(hint) => panic!("sqltest: {err} ({hint})"),
        None => panic!("sqltest: {err}"),
    }
}
