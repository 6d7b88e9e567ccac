use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::agents::{StructuredOutput, ValidationError};
use crate::models::{Balance, TransactionFields, TransactionType};
use crate::types::MessageId;

#[derive(Debug, Deserialize)]
pub struct AmountResponse {
    pub amount: Decimal
}

impl StructuredOutput for AmountResponse {
    type Validated = Decimal;

    const SHAPE: &'static str = r#"{"amount": <positive number>}"#;

    fn validate(self) -> Result<Decimal, ValidationError> {
        validate_amount(self.amount)
    }
}

#[derive(Debug, Deserialize)]
pub struct TypeResponse {
    pub transaction_type: String
}

impl StructuredOutput for TypeResponse {
    type Validated = TransactionType;

    const SHAPE: &'static str = r#"{"transaction_type": "Credit" | "Debit"}"#;

    fn validate(self) -> Result<TransactionType, ValidationError> {
        validate_transaction_type(&self.transaction_type)
    }
}

/// `available_balance: null` is the explicit "no balance in this email" answer.
#[derive(Debug, Deserialize)]
pub struct BalanceResponse {
    pub available_balance: Option<Decimal>
}

impl StructuredOutput for BalanceResponse {
    type Validated = Option<Decimal>;

    const SHAPE: &'static str = r#"{"available_balance": <non-negative number> | null}"#;

    fn validate(self) -> Result<Option<Decimal>, ValidationError> {
        self.available_balance.map(validate_balance).transpose()
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionDetails {
    pub transaction_amount: Decimal,
    pub transaction_type: String,
    #[serde(default)]
    pub available_balance: Option<Decimal>
}

impl TransactionDetails {
    pub fn validate(self) -> Result<TransactionFields, ValidationError> {
        Ok(TransactionFields {
            amount: validate_amount(self.transaction_amount)?,
            transaction_type: validate_transaction_type(&self.transaction_type)?,
            available_balance: Balance::from(self.available_balance.map(validate_balance).transpose()?)
        })
    }
}

/// Entries are kept as raw JSON so one bad entry does not void the rest of the batch.
#[derive(Debug, Deserialize)]
pub struct BatchResponse {
    pub transactions: HashMap<MessageId, Value>
}

impl StructuredOutput for BatchResponse {
    type Validated = HashMap<MessageId, Result<TransactionFields, ValidationError>>;

    const SHAPE: &'static str = r#"{"transactions": {"<message id>": {"transaction_amount": <positive number>, "transaction_type": "Credit" | "Debit", "available_balance": <non-negative number> | null}}}"#;

    fn validate(self) -> Result<Self::Validated, ValidationError> {
        Ok(self.transactions.into_iter()
            .map(|(message_id, entry)| {
                let fields = serde_json::from_value::<TransactionDetails>(entry)
                    .map_err(|error| ValidationError::Malformed(error.to_string()))
                    .and_then(TransactionDetails::validate);

                (message_id, fields)
            })
            .collect())
    }
}

fn validate_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount))
    }

    Ok(amount)
}

fn validate_transaction_type(value: &str) -> Result<TransactionType, ValidationError> {
    match value {
        "Credit" => Ok(TransactionType::Credit),
        "Debit" => Ok(TransactionType::Debit),
        _ => Err(ValidationError::InvalidTransactionType(value.to_string()))
    }
}

fn validate_balance(balance: Decimal) -> Result<Decimal, ValidationError> {
    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(ValidationError::NegativeBalance(balance))
    }

    Ok(balance)
}
