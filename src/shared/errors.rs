//! Error handling for the application

use thiserror::Error;

/// Configuration errors, raised eagerly at construction time
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Threshold out of range: {name} = {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("Isolation ensemble needs at least one tree")]
    EmptyEnsemble,

    #[error("Volatility window must cover at least 2 points, got {0}")]
    WindowTooSmall(usize),

    #[error("Cycle search needs at least 2 hops, got {0}")]
    CycleBoundTooSmall(usize),
}

/// Detection-related errors
#[derive(Error, Debug, Clone)]
pub enum DetectionError {
    #[error("Feature arity mismatch for point {id}: expected {expected}, found {found}")]
    FeatureArityMismatch {
        id: String,
        expected: usize,
        found: usize,
    },
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Detection error: {0}")]
    DetectionError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        AppError::DetectionError(err.to_string())
    }
}
