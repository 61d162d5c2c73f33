//! Error types and handling for the `KiteWindows` application

use thiserror::Error;

use crate::kitesurfing::AnalysisError;

/// Main error type for the `KiteWindows` application
#[derive(Error, Debug)]
pub enum KiteWindowsError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Errors raised by the kiteability analysis
    #[error("Analysis error: {source}")]
    Analysis {
        #[from]
        source: AnalysisError,
    },
}

impl KiteWindowsError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            KiteWindowsError::Config { .. } => {
                "Configuration error. Please check your config.json.".to_string()
            }
            KiteWindowsError::Api { .. } => {
                "Unable to reach the forecast service. Please check your internet connection."
                    .to_string()
            }
            KiteWindowsError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            KiteWindowsError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            KiteWindowsError::Analysis { source } => {
                format!("Forecast analysis failed: {source}")
            }
        }
    }
}
