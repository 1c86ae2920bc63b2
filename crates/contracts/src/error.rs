//! Layered error definitions
//!
//! Categorized by source: config / input / dataset

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// Malformed measurement handed to an estimator
    #[error("invalid input '{field}': {message}")]
    InputValidation { field: String, message: String },

    // ===== Dataset Errors =====
    /// Dataset file could not be parsed
    #[error("dataset parse error in {path} line {line}: {message}")]
    DatasetParse {
        path: String,
        line: usize,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create input validation error
    pub fn input_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dataset parse error
    pub fn dataset_parse(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::DatasetParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
