use thiserror::Error;

/// Why a single span or metric could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("{field} must be {expected} bytes, got {actual}")]
    InvalidIdLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} is not valid hex: {message}")]
    InvalidHexId { field: &'static str, message: String },

    #[error("{field} must not be all zeros")]
    ZeroId { field: &'static str },

    #[error("metric {name:?} has unsupported type {metric_type}")]
    UnsupportedMetricType { name: String, metric_type: String },

    #[error("metric {name:?} has a point without a value")]
    MissingPointValue { name: String },

    #[error("metric without a descriptor")]
    MissingDescriptor,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
