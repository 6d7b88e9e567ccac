//! Turns bank notification emails into structured transaction records.
//!
//! Extraction runs through three tiers in fixed precedence: per-field agents working
//! concurrently, a single agent handling whole batches, and a pattern matcher that
//! needs no backend. See [`engine::ExtractionPipeline`] for the entry point.

pub mod agents;
pub mod config;
pub mod engine;
pub mod extractors;
pub mod models;
pub mod retry;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{ExtractionConfig, Tier};
pub use engine::{Backends, ExtractionPipeline, ExtractionReport, ExtractionSummary};
pub use models::{Balance, RawMessage, TransactionRecord, TransactionType};
