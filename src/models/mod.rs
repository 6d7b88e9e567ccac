mod errors;
mod message;
mod record;

use std::fmt;
use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

pub use errors::MessageError;
pub use message::RawMessage;
pub use record::{TransactionFields, TransactionRecord};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Credit,
    Debit,
    /// Only produced by the deterministic extractor when no direction could be inferred.
    Unknown
}

impl TransactionType {
    pub fn is_known(&self) -> bool {
        !matches!(self, TransactionType::Unknown)
    }
}

impl Display for TransactionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Credit => "Credit",
            TransactionType::Debit => "Debit",
            TransactionType::Unknown => "Unknown"
        };

        formatter.write_str(label)
    }
}

/// Balance reported by the notification after the transaction was applied.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Balance {
    Available(Decimal),
    Unknown
}

impl From<Option<Decimal>> for Balance {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Balance::Unknown, Balance::Available)
    }
}

impl Display for Balance {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Balance::Available(amount) => write!(formatter, "{amount}"),
            Balance::Unknown => formatter.write_str("unknown")
        }
    }
}

impl Serialize for Balance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
