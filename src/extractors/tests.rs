use super::{
    BatchExtractor, DeterministicExtractor, ExtractionError, Field, FieldOutcome, ParallelAgentsExtractor,
    SingleAgentExtractor
};
use crate::agents::{AgentError, ValidationError, AMOUNT_AGENT, BALANCE_AGENT, BATCH_AGENT, TYPE_AGENT};
use crate::config::ExtractionConfig;
use crate::models::{Balance, RawMessage, TransactionType};
use crate::retry::Retryable;
use crate::testing::{bad_status, unreachable, ScriptedBackend};

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

const DEBIT_WITH_BALANCE: &str =
    "Rs. Debited for INR 1,250.50 on 12-03-2024. The balance available in your Account is INR 8,000.00";

fn fast_config() -> ExtractionConfig {
    ExtractionConfig {
        field_retry_delay: Duration::ZERO,
        ..ExtractionConfig::default()
    }
}

fn decimal(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value)?)
}

/// Field agents that always answer with a valid debit of 1250.50 and a balance of 8000.
fn answer_field(agent: &str) -> String {
    match agent {
        AMOUNT_AGENT => r#"{"amount": 1250.50}"#,
        TYPE_AGENT => r#"{"transaction_type": "Debit"}"#,
        BALANCE_AGENT => r#"{"available_balance": 8000}"#,
        _ => "{}"
    }.to_string()
}

#[test]
fn test_deterministic_reads_directed_amount_and_account_balance() -> Result<()> {
    let fields = DeterministicExtractor::new().extract(DEBIT_WITH_BALANCE);

    assert_eq!(fields.amount, decimal("1250.50")?);
    assert_eq!(fields.transaction_type, TransactionType::Debit);
    assert_eq!(fields.available_balance, Balance::Available(decimal("8000.00")?));

    Ok(())
}

#[test]
fn test_deterministic_defaults_when_nothing_matches() {
    let fields = DeterministicExtractor::new().extract("Your one time password is 4321. Do not share it.");

    assert_eq!(fields.amount, Decimal::ZERO);
    assert_eq!(fields.transaction_type, TransactionType::Unknown);
    assert_eq!(fields.available_balance, Balance::Available(Decimal::ZERO));
}

#[test]
fn test_deterministic_credited_for_is_case_insensitive() -> Result<()> {
    let fields = DeterministicExtractor::new().extract("Salary CREDITED FOR Rs 45,000 to your account XX1234");

    assert_eq!(fields.amount, decimal("45000")?);
    assert_eq!(fields.transaction_type, TransactionType::Credit);
    assert_eq!(fields.available_balance, Balance::Available(Decimal::ZERO));

    Ok(())
}

#[test]
fn test_deterministic_skips_zero_amounts_to_later_patterns() -> Result<()> {
    let body = "Reversal credited for INR 0.00. Your refund has been credited for INR 500.00";
    let fields = DeterministicExtractor::new().extract(body);

    assert_eq!(fields.amount, decimal("500.00")?);
    assert_eq!(fields.transaction_type, TransactionType::Credit);

    Ok(())
}

#[test]
fn test_deterministic_generic_amount_with_current_balance() -> Result<()> {
    let body = "Payment of ₹300 made via UPI. Debit alert. Current balance: ₹1,200.50";
    let fields = DeterministicExtractor::new().extract(body);

    assert_eq!(fields.amount, decimal("300")?);
    assert_eq!(fields.transaction_type, TransactionType::Debit);
    assert_eq!(fields.available_balance, Balance::Available(decimal("1200.50")?));

    Ok(())
}

#[test]
fn test_deterministic_generic_type_is_inferred_from_whole_body() -> Result<()> {
    let fields = DeterministicExtractor::new().extract("You spent INR 99 using your credit card ending 0042");

    assert_eq!(fields.amount, decimal("99")?);
    assert_eq!(fields.transaction_type, TransactionType::Credit);

    Ok(())
}

#[test]
fn test_deterministic_currency_code_must_start_a_word() -> Result<()> {
    let fields = DeterministicExtractor::new().extract("Charge applied to ACCOUNTRs 45 today");

    assert_eq!(fields.amount, Decimal::ZERO);
    assert_eq!(fields.transaction_type, TransactionType::Unknown);

    let fields = DeterministicExtractor::new().extract("Charge applied to ACCOUNT Rs 45 today, debit posted");

    assert_eq!(fields.amount, decimal("45")?);
    assert_eq!(fields.transaction_type, TransactionType::Debit);

    Ok(())
}

#[test]
fn test_deterministic_extraction_is_repeatable() {
    let extractor = DeterministicExtractor::new();

    assert_eq!(extractor.extract(DEBIT_WITH_BALANCE), extractor.extract(DEBIT_WITH_BALANCE));
}

#[tokio::test]
async fn test_deterministic_round_fails_only_malformed_messages() -> Result<()> {
    let pending = vec![
        RawMessage::new("good", 1_700_000_000, DEBIT_WITH_BALANCE),
        RawMessage::new("bad", i64::MAX, DEBIT_WITH_BALANCE)
    ];

    let round = DeterministicExtractor::new().attempt(pending, &fast_config()).await?;

    assert_eq!(round.succeeded.len(), 1);
    assert_eq!(round.succeeded[0].transaction_id, "good");
    assert_eq!(round.failed.len(), 1);
    assert_eq!(round.failed[0].0.id, "bad");

    Ok(())
}

#[test]
fn test_field_outcome_separates_optional_from_mandatory() -> Result<()> {
    let failure = || ExtractionError::field_missing(Field::Balance);

    assert!(matches!(FieldOutcome::<u8>::settle(Field::Balance, Err(failure()))?, FieldOutcome::AbsentOptional));
    assert!(matches!(FieldOutcome::<u8>::settle(Field::Balance, Ok(None))?, FieldOutcome::AbsentOptional));
    assert!(matches!(FieldOutcome::<u8>::settle(Field::Amount, Ok(None))?, FieldOutcome::AbsentMandatory(_)));
    assert!(matches!(FieldOutcome::settle(Field::Type, Ok(Some(1u8)))?, FieldOutcome::Present(1)));

    let fatal = ExtractionError::backend_unavailable(&unreachable());
    assert!(FieldOutcome::<u8>::settle(Field::Balance, Err(fatal)).is_err());

    Ok(())
}

#[test]
fn test_only_unreachable_backends_are_fatal() {
    assert!(ExtractionError::agent(Field::Amount, AgentError::Backend(unreachable())).is_fatal());
    assert!(!ExtractionError::agent(Field::Amount, AgentError::Backend(bad_status())).is_fatal());
    assert!(!ExtractionError::agent(Field::Type, AgentError::Validation(ValidationError::Malformed("x".to_string()))).is_fatal());
    assert!(!ExtractionError::missing_from_batch("m1").is_fatal());
}

#[tokio::test]
async fn test_parallel_builds_record_from_three_agents() -> Result<()> {
    let backend = ScriptedBackend::new(|request, _| Ok(answer_field(&request.agent))).shared();
    let extractor = ParallelAgentsExtractor::new(backend.clone());
    let message = RawMessage::new("m1", 1_700_000_000, DEBIT_WITH_BALANCE);

    let record = extractor.extract_message(&message, &fast_config()).await?;

    assert_eq!(record.transaction_id, "m1");
    assert_eq!(record.amount, decimal("1250.50")?);
    assert_eq!(record.transaction_type, TransactionType::Debit);
    assert_eq!(record.available_balance, Balance::Available(decimal("8000")?));
    assert_eq!(backend.total_calls(), 3);

    let requests = backend.requests();
    assert!(requests.iter().all(|request| request.prompt == DEBIT_WITH_BALANCE));

    Ok(())
}

#[tokio::test]
async fn test_parallel_failing_balance_becomes_unknown() -> Result<()> {
    let backend = ScriptedBackend::new(|request, _| match request.agent.as_str() {
        BALANCE_AGENT => Err(bad_status()),
        agent => Ok(answer_field(agent))
    }).shared();
    let extractor = ParallelAgentsExtractor::new(backend.clone());
    let config = fast_config();

    let record = extractor.extract_message(&RawMessage::new("m1", 1_700_000_000, "body"), &config).await?;

    assert_eq!(record.available_balance, Balance::Unknown);
    assert_eq!(backend.calls(BALANCE_AGENT), config.field_attempts());

    Ok(())
}

#[tokio::test]
async fn test_parallel_null_balance_is_not_retried() -> Result<()> {
    let backend = ScriptedBackend::new(|request, _| match request.agent.as_str() {
        BALANCE_AGENT => Ok(r#"{"available_balance": null}"#.to_string()),
        agent => Ok(answer_field(agent))
    }).shared();
    let extractor = ParallelAgentsExtractor::new(backend.clone());

    let record = extractor.extract_message(&RawMessage::new("m1", 1_700_000_000, "body"), &fast_config()).await?;

    assert_eq!(record.available_balance, Balance::Unknown);
    assert_eq!(backend.calls(BALANCE_AGENT), 1);

    Ok(())
}

#[tokio::test]
async fn test_parallel_retries_field_until_valid() -> Result<()> {
    let backend = ScriptedBackend::new(|request, previous| match (request.agent.as_str(), previous) {
        (AMOUNT_AGENT, 0) => Ok(r#"{"amount": "a lot"}"#.to_string()),
        (agent, _) => Ok(answer_field(agent))
    }).shared();
    let extractor = ParallelAgentsExtractor::new(backend.clone());

    let record = extractor.extract_message(&RawMessage::new("m1", 1_700_000_000, "body"), &fast_config()).await?;

    assert_eq!(record.amount, decimal("1250.50")?);
    assert_eq!(backend.calls(AMOUNT_AGENT), 2);

    Ok(())
}

#[tokio::test]
async fn test_parallel_exhausted_amount_fails_message() -> Result<()> {
    let backend = ScriptedBackend::new(|request, _| match request.agent.as_str() {
        AMOUNT_AGENT => Ok(r#"{"amount": 0}"#.to_string()),
        agent => Ok(answer_field(agent))
    }).shared();
    let extractor = ParallelAgentsExtractor::new(backend.clone());
    let config = fast_config();

    let error = extractor.extract_message(&RawMessage::new("m1", 1_700_000_000, "body"), &config).await
        .err()
        .ok_or_else(|| anyhow!("message should fail without an amount"))?;

    assert!(matches!(error, ExtractionError::MessageExtraction { ref message_id, .. } if message_id == "m1"));
    assert!(!error.is_fatal());
    assert_eq!(backend.calls(AMOUNT_AGENT), config.field_attempts());

    Ok(())
}

#[tokio::test]
async fn test_parallel_round_reports_failures_per_message() -> Result<()> {
    let backend = ScriptedBackend::new(|request, _| match request.agent.as_str() {
        TYPE_AGENT if request.prompt.contains("refund") => Ok(r#"{"transaction_type": "Unknown"}"#.to_string()),
        agent => Ok(answer_field(agent))
    }).shared();
    let extractor = ParallelAgentsExtractor::new(backend);
    let pending = vec![
        RawMessage::new("m1", 1_700_000_000, "debit"),
        RawMessage::new("m2", 1_700_000_100, "refund"),
        RawMessage::new("m3", 1_700_000_200, "debit")
    ];

    let round = extractor.attempt(pending, &fast_config()).await?;

    let mut succeeded: Vec<_> = round.succeeded.iter().map(|record| record.transaction_id.as_str()).collect();
    succeeded.sort();

    assert_eq!(succeeded, vec!["m1", "m3"]);
    assert_eq!(round.failed.len(), 1);
    assert_eq!(round.failed[0].0.id, "m2");

    Ok(())
}

#[tokio::test]
async fn test_parallel_unreachable_backend_aborts_round() {
    let backend = ScriptedBackend::new(|request, _| match request.agent.as_str() {
        TYPE_AGENT => Err(unreachable()),
        agent => Ok(answer_field(agent))
    }).shared();
    let extractor = ParallelAgentsExtractor::new(backend.clone());
    let config = fast_config();

    let result = extractor.attempt(vec![RawMessage::new("m1", 1_700_000_000, "body")], &config).await;

    assert!(matches!(result, Err(ExtractionError::BackendUnavailable { .. })));
    assert_eq!(backend.calls(TYPE_AGENT), 1);
}

/// Batch agent answering each id in the payload with whatever `entry` returns for it.
fn batch_backend(entry: fn(&str) -> Option<&'static str>) -> Arc<ScriptedBackend> {
    ScriptedBackend::new(move |request, _| {
        let payload: HashMap<String, String> = serde_json::from_str(&request.prompt)
            .map_err(|_| bad_status())?;

        let transactions: Vec<String> = payload.keys()
            .filter_map(|id| entry(id).map(|details| format!("\"{id}\": {details}")))
            .collect();

        Ok(format!("<think>checking</think>{{\"transactions\": {{{}}}}}", transactions.join(", ")))
    }).shared()
}

#[tokio::test]
async fn test_single_round_retries_missing_and_invalid_entries() -> Result<()> {
    let backend = batch_backend(|id| match id {
        "a" => Some(r#"{"transaction_amount": 42.10, "transaction_type": "Credit", "available_balance": null}"#),
        "b" => Some(r#"{"transaction_amount": 10, "transaction_type": "Refund"}"#),
        _ => None
    });
    let extractor = SingleAgentExtractor::new(backend.clone());
    let pending = vec![
        RawMessage::new("a", 1_700_000_000, "first"),
        RawMessage::new("b", 1_700_000_100, "second"),
        RawMessage::new("c", 1_700_000_200, "third")
    ];

    let round = extractor.attempt(pending, &fast_config()).await?;

    assert_eq!(round.succeeded.len(), 1);
    assert_eq!(round.succeeded[0].amount, decimal("42.10")?);
    assert_eq!(round.succeeded[0].transaction_type, TransactionType::Credit);
    assert_eq!(round.succeeded[0].available_balance, Balance::Unknown);

    let mut failed: Vec<_> = round.failed.iter().map(|(message, _)| message.id.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["b", "c"]);
    assert_eq!(backend.calls(BATCH_AGENT), 1);

    Ok(())
}

#[tokio::test]
async fn test_single_call_error_fails_whole_round() -> Result<()> {
    let backend = ScriptedBackend::new(|_, _| Err(bad_status())).shared();
    let extractor = SingleAgentExtractor::new(backend);
    let pending = vec![
        RawMessage::new("a", 1_700_000_000, "first"),
        RawMessage::new("b", 1_700_000_100, "second")
    ];

    let round = extractor.attempt(pending, &fast_config()).await?;

    assert!(round.succeeded.is_empty());
    assert_eq!(round.failed.len(), 2);
    assert!(round.failed.iter().all(|(_, error)| !error.is_fatal()));

    Ok(())
}

#[tokio::test]
async fn test_single_unreachable_backend_is_fatal() {
    let backend = ScriptedBackend::new(|_, _| Err(unreachable())).shared();
    let extractor = SingleAgentExtractor::new(backend);

    let result = extractor.attempt(vec![RawMessage::new("a", 1_700_000_000, "first")], &fast_config()).await;

    assert!(matches!(result, Err(ExtractionError::BackendUnavailable { .. })));
}

#[tokio::test]
async fn test_single_inspect_reports_raw_answer_and_fields() -> Result<()> {
    let backend = batch_backend(|_| {
        Some(r#"{"transaction_amount": 1250.50, "transaction_type": "Debit", "available_balance": 8000}"#)
    });
    let extractor = SingleAgentExtractor::new(backend);
    let message = RawMessage::new("m1", 1_700_000_000, "x".repeat(250));

    let inspection = extractor.inspect(&message).await;

    assert!(inspection.success);
    assert!(inspection.error.is_none());
    assert!(inspection.raw_response.as_deref().is_some_and(|raw| raw.contains("<think>")));
    assert_eq!(inspection.body_preview.len(), 203);
    assert!(inspection.received_at.is_some());

    let fields = inspection.extracted.ok_or_else(|| anyhow!("fields missing"))?;
    assert_eq!(fields.amount, decimal("1250.50")?);
    assert_eq!(fields.available_balance, Balance::Available(decimal("8000")?));

    Ok(())
}

#[tokio::test]
async fn test_single_inspect_explains_missing_entry() {
    let extractor = SingleAgentExtractor::new(batch_backend(|_| None));

    let inspection = extractor.inspect(&RawMessage::new("m1", 1_700_000_000, "short")).await;

    assert!(!inspection.success);
    assert_eq!(inspection.body_preview, "short");
    assert!(inspection.raw_response.is_some());
    assert!(inspection.error.is_some_and(|error| error.contains("not found")));
}
