use std::fmt::Display;
use std::future::Future;
use std::mem::take;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

/// Errors that can tell a failed attempt apart from a failure that makes further attempts pointless.
pub trait Retryable: Display {
    fn is_fatal(&self) -> bool;
}

/// Result of one attempt over a set of work items.
#[derive(Debug)]
pub struct RoundOutcome<I, R, E> {
    pub succeeded: Vec<R>,
    pub failed: Vec<(I, E)>
}

impl<I, R, E> Default for RoundOutcome<I, R, E> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new()
        }
    }
}

/// Result of running work items to completion or exhaustion.
///
/// Every item handed in ends up either as a result in `succeeded` or, together with the
/// error of its last attempt, in `failed`.
#[derive(Debug)]
pub struct RetryOutcome<I, R, E> {
    pub succeeded: Vec<R>,
    pub failed: Vec<(I, E)>,
    pub attempts: usize
}

/// Bounded retry of fallible work, shared by the message and field levels.
#[derive(Debug, Clone, Copy)]
pub struct RetryController {
    max_attempts: usize,
    delay: Duration
}

impl RetryController {
    /// `max_attempts` counts the first try; at least one attempt is always made.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Runs `round` over the items that are still pending until none are left or the
    /// attempt budget is spent.
    ///
    /// A round returning `Err` aborts immediately with that error; items it reports as
    /// failed are carried into the next round.
    pub async fn run<I, R, E, F, Fut>(&self, items: Vec<I>, mut round: F) -> Result<RetryOutcome<I, R, E>, E>
    where
        E: Retryable,
        F: FnMut(Vec<I>) -> Fut,
        Fut: Future<Output = Result<RoundOutcome<I, R, E>, E>>,
    {
        let mut succeeded = Vec::new();
        let mut failed: Vec<(I, E)> = Vec::new();
        let mut pending = items;
        let mut attempts = 0;

        while !pending.is_empty() && attempts < self.max_attempts {
            if attempts > 0 {
                debug!("Retry {attempts}/{} for {} items", self.max_attempts - 1, pending.len());
                self.pause().await;
            }

            attempts += 1;

            let outcome = round(take(&mut pending)).await?;
            succeeded.extend(outcome.succeeded);
            failed = outcome.failed;

            if attempts < self.max_attempts {
                pending = failed.drain(..).map(|(item, _)| item).collect();
            }
        }

        Ok(RetryOutcome {
            succeeded,
            failed,
            attempts
        })
    }

    /// Retries a single operation, returning its first success or the error of its last attempt.
    ///
    /// Fatal errors are returned without further attempts.
    pub async fn run_single<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt_number = 1;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_fatal() || attempt_number >= self.max_attempts => return Err(error),
                Err(error) => debug!("Attempt {attempt_number}/{} failed: {error}", self.max_attempts)
            }

            attempt_number += 1;
            self.pause().await;
        }
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}
