use thiserror::Error;

use crate::{DataType, ValueKind};

#[derive(Debug, Error)]
pub enum AcError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error(
        "Record {record_id}: attribute value `{value}` is of type {kind}, \
         but data_type {data_type} requires {expected}."
    )]
    Validation {
        record_id: String,
        value: String,
        kind: ValueKind,
        data_type: DataType,
        expected: String,
    },

    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    #[error("Calculation failed for record {record_id}: {message}")]
    Calculation { record_id: String, message: String },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AcError {
    pub fn transport(message: impl Into<String>) -> Self {
        AcError::Transport { message: message.into(), source: None }
    }

    /// Transport failure that keeps the underlying cause in the error chain.
    pub fn transport_from(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AcError::Transport { message: message.into(), source: Some(Box::new(source)) }
    }
}

pub type Result<T> = std::result::Result<T, AcError>;
