use thiserror::Error;

use crate::agents::{AgentError, BackendError, ValidationError};
use crate::extractors::Field;
use crate::models::MessageError;
use crate::retry::Retryable;
use crate::types::MessageId;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Backend [{backend}] is unavailable: {reason}")]
    BackendUnavailable {
        backend: String,
        reason: String
    },
    #[error("Extraction of field [{field}] failed: {reason}")]
    FieldExtraction {
        field: Field,
        reason: String
    },
    #[error("Extraction of message [{message_id}] failed: {reason}")]
    MessageExtraction {
        message_id: MessageId,
        reason: String
    },
    #[error("Field [{field}] failed validation: {source}")]
    Validation {
        field: Field,
        #[source]
        source: ValidationError
    }
}

impl ExtractionError {
    pub fn backend_unavailable(error: &BackendError) -> Self {
        Self::BackendUnavailable {
            backend: error.backend().to_string(),
            reason: error.to_string()
        }
    }

    /// Maps an agent failure on `field`; only an unreachable backend is fatal.
    pub fn agent(field: Field, error: AgentError) -> Self {
        match error {
            AgentError::Backend(error) if error.is_unreachable() => Self::backend_unavailable(&error),
            AgentError::Backend(error) => Self::FieldExtraction { field, reason: error.to_string() },
            AgentError::Validation(source) => Self::Validation { field, source }
        }
    }

    pub fn field_missing(field: Field) -> Self {
        Self::FieldExtraction {
            field,
            reason: "agent reported the field as not present".to_string()
        }
    }

    pub fn message(message_id: &str, reason: impl Into<String>) -> Self {
        Self::MessageExtraction {
            message_id: message_id.to_string(),
            reason: reason.into()
        }
    }

    pub fn missing_from_batch(message_id: &str) -> Self {
        Self::message(message_id, "no result returned for this message id")
    }

    pub fn invalid_entry(message_id: &str, error: &ValidationError) -> Self {
        Self::message(message_id, format!("invalid result: {error}"))
    }

    pub fn malformed_message(error: &MessageError) -> Self {
        match error {
            MessageError::InvalidTimestamp { message_id, .. } | MessageError::DuplicateId { message_id } => {
                Self::message(message_id, error.to_string())
            },
            MessageError::EmptyId => Self::message("", error.to_string())
        }
    }

    /// Wraps a field level failure into a failure of the whole message, keeping fatal errors as is.
    pub fn escalate(self, message_id: &str) -> Self {
        if self.is_fatal() {
            return self
        }

        Self::message(message_id, self.to_string())
    }
}

impl Retryable for ExtractionError {
    fn is_fatal(&self) -> bool {
        matches!(self, ExtractionError::BackendUnavailable { .. })
    }
}
