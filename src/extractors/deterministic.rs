use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{ExtractionConfig, Tier};
use crate::extractors::{BatchExtractor, ExtractionError, MessageRound};
use crate::models::{Balance, MessageError, RawMessage, TransactionFields, TransactionRecord, TransactionType};
use crate::types::parse_amount;

//NOTE: ₹ is not a word character, so only the letter codes get a boundary
const CURRENCY: &str = r"(?:\bINR|\bRs\.?|₹)";

static DIRECTED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(Debited|Credited) for {CURRENCY}\s*([\d,]+\.\d+)")).expect("valid regex")
});

static ACCOUNT_BALANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"balance available\b.*?\bis\s+{CURRENCY}\s*([\d,]+\.\d+)")).expect("valid regex")
});

static CREDITED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)credited for {CURRENCY}\s*([\d,]+(?:\.\d+)?)")).expect("valid regex")
});

static HAS_BEEN_CREDITED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"has been credited for {CURRENCY}\s*([\d,]+(?:\.\d+)?)")).expect("valid regex")
});

static ANY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{CURRENCY}\s*([\d,]+(?:\.\d+)?)")).expect("valid regex")
});

static ANY_BALANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:available|current) balance[:\s]+(?:is\s+)?(?:{CURRENCY}\s*)?([\d,]+(?:\.\d+)?)")).expect("valid regex")
});

/// Pattern based extraction; needs no backend and always yields fields.
///
/// Bodies without a recognisable amount produce a zero amount of unknown type, leaving the
/// decision whether it is a real transaction to whoever consumes the records.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicExtractor;

impl DeterministicExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, body: &str) -> TransactionFields {
        let mut amount = None;
        let mut transaction_type = TransactionType::Unknown;
        let mut balance = None;

        if let Some(captures) = DIRECTED_AMOUNT.captures(body) {
            amount = capture_amount(&captures, 2);
            transaction_type = match &captures[1] {
                "Debited" => TransactionType::Debit,
                _ => TransactionType::Credit
            };
            balance = ACCOUNT_BALANCE.captures(body).and_then(|captures| capture_amount(&captures, 1));
        } else if let Some(captures) = CREDITED_AMOUNT.captures(body) {
            amount = capture_amount(&captures, 1);
            transaction_type = TransactionType::Credit;
        }

        if amount.is_none() {
            if let Some(captures) = HAS_BEEN_CREDITED_AMOUNT.captures(body) {
                amount = capture_amount(&captures, 1);
                transaction_type = TransactionType::Credit;
            } else if let Some(captures) = ANY_AMOUNT.captures(body) {
                amount = capture_amount(&captures, 1);
                transaction_type = infer_type(body);
            }
        }

        if balance.is_none() {
            balance = ANY_BALANCE.captures(body).and_then(|captures| capture_amount(&captures, 1));
        }

        TransactionFields {
            amount: amount.unwrap_or(Decimal::ZERO),
            transaction_type,
            available_balance: Balance::Available(balance.unwrap_or(Decimal::ZERO))
        }
    }

    pub fn extract_message(&self, message: &RawMessage) -> Result<TransactionRecord, MessageError> {
        TransactionRecord::new(message, self.extract(&message.body))
    }
}

/// A capture only counts when it parses to a non-zero amount.
fn capture_amount(captures: &regex::Captures<'_>, group: usize) -> Option<Decimal> {
    captures.get(group)
        .and_then(|value| parse_amount(value.as_str()).ok())
        .filter(|amount| !amount.is_zero())
}

/// Looks at the whole body, not just the text around the amount.
fn infer_type(body: &str) -> TransactionType {
    let body = body.to_lowercase();

    if body.contains("credit") {
        TransactionType::Credit
    } else if body.contains("debit") {
        TransactionType::Debit
    } else {
        TransactionType::Unknown
    }
}

#[async_trait]
impl BatchExtractor for DeterministicExtractor {
    fn tier(&self) -> Tier {
        Tier::Deterministic
    }

    async fn attempt(&self, pending: Vec<RawMessage>, _config: &ExtractionConfig) -> Result<MessageRound, ExtractionError> {
        let mut outcome = MessageRound::default();

        for message in pending {
            match self.extract_message(&message) {
                Ok(record) => {
                    debug!("Message [{}] matched as [{}] of [{}]", record.transaction_id, record.transaction_type, record.amount);
                    outcome.succeeded.push(record);
                },
                Err(error) => {
                    let error = ExtractionError::malformed_message(&error);
                    outcome.failed.push((message, error));
                }
            }
        }

        Ok(outcome)
    }
}
