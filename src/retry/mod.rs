mod controller;

pub use controller::{Retryable, RetryController, RetryOutcome, RoundOutcome};
