use crate::types::MessageId;
use thiserror::Error;

/// Contract violations on the messages handed to the pipeline.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Message has an empty id")]
    EmptyId,
    #[error("Message [{message_id}] was submitted more than once")]
    DuplicateId {
        message_id: MessageId
    },
    #[error("Message [{message_id}] has an out of range timestamp [{timestamp}]")]
    InvalidTimestamp {
        message_id: MessageId,
        timestamp: i64
    }
}
