use thiserror::Error;

/// Errors raised while classifying a spot's forecast
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A single forecast sample is physically out of range or incomplete
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// Sector or band ladder cannot be used for classification
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
