use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend [{backend}] is unreachable: {reason}")]
    Unreachable {
        backend: String,
        reason: String
    },
    #[error("Backend [{backend}] did not answer in time")]
    Timeout {
        backend: String
    },
    #[error("Backend [{backend}] answered with status [{status}]: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String
    },
    #[error("Backend [{backend}] returned an unreadable response: {reason}")]
    InvalidResponse {
        backend: String,
        reason: String
    }
}

impl BackendError {
    /// True when the backend cannot be reached at all, as opposed to a single bad answer.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, BackendError::Unreachable { .. })
    }

    pub fn backend(&self) -> &str {
        match self {
            BackendError::Unreachable { backend, .. }
            | BackendError::Timeout { backend }
            | BackendError::Status { backend, .. }
            | BackendError::InvalidResponse { backend, .. } => backend
        }
    }
}

/// A structured response that breaks its field contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Response does not match the expected shape: {0}")]
    Malformed(String),
    #[error("Amount [{0}] must be greater than zero")]
    NonPositiveAmount(Decimal),
    #[error("Transaction type [{0}] must be exactly Credit or Debit")]
    InvalidTransactionType(String),
    #[error("Balance [{0}] must not be negative")]
    NegativeBalance(Decimal)
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Validation(#[from] ValidationError)
}
