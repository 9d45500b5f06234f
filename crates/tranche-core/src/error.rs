use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrancheError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Invariant violation in {context}: expected {expected}, got {actual} (tolerance: {tolerance})")]
    InvariantViolation {
        context: String,
        expected: Decimal,
        actual: Decimal,
        tolerance: Decimal,
    },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TrancheError {
    fn from(e: serde_json::Error) -> Self {
        TrancheError::SerializationError(e.to_string())
    }
}
