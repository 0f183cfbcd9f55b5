//! Unified error type for the planning toolkit
//!
//! Domain-specific errors (configuration, routing, optimization) convert
//! into [`LvError`] so callers at the API boundary can handle them uniformly.
//!
//! # Example
//!
//! ```ignore
//! use lvplan_core::{LvError, LvResult};
//!
//! fn plan(path: &str) -> LvResult<()> {
//!     let config = load_config(path)?;
//!     route_clusters(&grid, &clusters, &config)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all planning operations.
#[derive(Error, Debug)]
pub enum LvError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input data validation errors (missing IDs, malformed tables)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Routing errors that abort a single cluster
    #[error("Routing error: {0}")]
    Routing(String),

    /// Optimization solver errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using LvError.
pub type LvResult<T> = Result<T, LvError>;

impl From<anyhow::Error> for LvError {
    fn from(err: anyhow::Error) -> Self {
        LvError::Other(err.to_string())
    }
}

impl From<String> for LvError {
    fn from(s: String) -> Self {
        LvError::Other(s)
    }
}

impl From<&str> for LvError {
    fn from(s: &str) -> Self {
        LvError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for LvError {
    fn from(err: serde_json::Error) -> Self {
        LvError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_error_display() {
        let err = LvError::Routing("point 42 missing from grid".into());
        assert!(err.to_string().contains("Routing error"));
        assert!(err.to_string().contains("point 42"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LvError = io_err.into();
        assert!(matches!(err, LvError::Io(_)));
    }

    #[test]
    fn test_config_error_names_field() {
        let err: LvError = ConfigError::NonPositive {
            field: "routing.resolution",
            value: 0.0,
        }
        .into();
        assert!(err.to_string().contains("routing.resolution"));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> LvResult<()> {
            Err(LvError::Validation("test".into()))
        }

        fn outer() -> LvResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
