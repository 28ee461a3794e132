//! Error types for Jiwa relapse scoring

use thiserror::Error;

/// Errors that can occur while configuring or running the scoring pipeline
#[derive(Debug, Error)]
pub enum RelapseError {
    #[error("Feature/weight key set mismatch (missing: {missing:?}, unexpected: {unexpected:?})")]
    KeySetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Invalid weight for {feature}: {value} (weights must be finite and positive)")]
    InvalidWeight { feature: String, value: f64 },

    #[error("Feature {feature} out of range: {value} (expected 0-1)")]
    FeatureOutOfRange { feature: String, value: f64 },

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse patient snapshot: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Snapshot failed validation with {0} issue(s)")]
    ValidationFailed(usize),
}
