use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Balance, MessageError, RawMessage, TransactionType};
use crate::types::MessageId;

/// The three fields every extraction tier is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransactionFields {
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub available_balance: Balance
}

/// A transaction recovered from a notification email.
///
/// Records are immutable once built; ownership is handed to the persistence layer,
/// which deduplicates on `(user, transaction_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Same value as the id of the message it was extracted from.
    pub transaction_id: MessageId,
    pub transaction_date: DateTime<Utc>,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub available_balance: Balance,
    pub raw_body: String
}

impl TransactionRecord {
    pub fn new(message: &RawMessage, fields: TransactionFields) -> Result<Self, MessageError> {
        Ok(Self {
            transaction_id: message.id.clone(),
            transaction_date: message.received_at()?,
            amount: fields.amount,
            transaction_type: fields.transaction_type,
            available_balance: fields.available_balance,
            raw_body: message.body.clone()
        })
    }

    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            amount: self.amount,
            transaction_type: self.transaction_type,
            available_balance: self.available_balance
        }
    }
}
