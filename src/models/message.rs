use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MessageError;
use crate::types::MessageId;

/// A single notification email as handed over by the mail retrieval layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider assigned identifier, reused as the transaction id.
    pub id: MessageId,
    /// Unix time (seconds) the message was received.
    pub timestamp: i64,
    /// Plain text body of the email.
    pub body: String
}

impl RawMessage {
    pub fn new(id: impl Into<MessageId>, timestamp: i64, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            body: body.into()
        }
    }

    pub fn received_at(&self) -> Result<DateTime<Utc>, MessageError> {
        DateTime::from_timestamp(self.timestamp, 0).ok_or_else(|| MessageError::InvalidTimestamp {
            message_id: self.id.clone(),
            timestamp: self.timestamp
        })
    }

    /// Checks the invariants the pipeline relies on before any extraction starts.
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.id.trim().is_empty() {
            return Err(MessageError::EmptyId)
        }

        self.received_at()?;

        Ok(())
    }
}
