use std::collections::HashSet;
use std::fs::File;
use std::io::{stderr, stdout, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use mail_transaction_extractor::agents::{InferenceBackend, OllamaBackend, DEFAULT_BASE_URL};
use mail_transaction_extractor::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_FIELD_RETRIES, DEFAULT_MAX_MESSAGE_RETRIES, DEFAULT_MAX_WORKERS
};
use mail_transaction_extractor::storage::{MemoryTransactionStore, TransactionStore};
use mail_transaction_extractor::{Backends, ExtractionConfig, ExtractionPipeline, RawMessage, Tier, TransactionRecord};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Extracts bank transactions from notification emails and prints them as CSV.
#[derive(Debug, Parser)]
#[command(name = "mail-transaction-extractor", version)]
struct Cli {
    /// CSV file with `id,timestamp,body` columns.
    #[arg(required_unless_present = "diagnostics")]
    input: Option<PathBuf>,

    /// Most capable tier allowed: parallel-agents, single-agent or deterministic.
    #[arg(long, env = "EXTRACTOR_STRATEGY", default_value = "parallel-agents")]
    strategy: Tier,

    #[arg(long, env = "EXTRACTOR_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, env = "EXTRACTOR_MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    #[arg(long, env = "EXTRACTOR_MAX_MESSAGE_RETRIES", default_value_t = DEFAULT_MAX_MESSAGE_RETRIES)]
    max_message_retries: usize,

    #[arg(long, env = "EXTRACTOR_MAX_FIELD_RETRIES", default_value_t = DEFAULT_MAX_FIELD_RETRIES)]
    max_field_retries: usize,

    #[arg(long, env = "EXTRACTOR_FIELD_RETRY_DELAY_MS", default_value_t = 500)]
    field_retry_delay_ms: u64,

    #[arg(long, env = "EXTRACTOR_PROBE_TIMEOUT_MS", default_value_t = 5_000)]
    probe_timeout_ms: u64,

    #[arg(long, env = "EXTRACTOR_REQUEST_TIMEOUT_MS", default_value_t = 120_000)]
    request_timeout_ms: u64,

    #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    ollama_url: String,

    /// Model behind the per-field agents.
    #[arg(long, env = "EXTRACTOR_PARALLEL_MODEL", default_value = "qwen:0.5b")]
    parallel_model: String,

    /// Model behind the whole-batch agent.
    #[arg(long, env = "EXTRACTOR_SINGLE_MODEL", default_value = "deepseek-r1:8b")]
    single_model: String,

    /// User the extracted records are saved for.
    #[arg(long, env = "EXTRACTOR_USER", default_value = "local")]
    user: String,

    /// One of error, warn, info, debug, trace.
    #[arg(long, env = "EXTRACTOR_LOG_LEVEL", default_value = "error")]
    log_level: String,

    /// Print backend availability and effective settings as JSON, then exit.
    #[arg(long)]
    diagnostics: bool,

    /// Run a single message through the batch agent and print every step as JSON.
    #[arg(long, value_name = "MESSAGE_ID")]
    inspect: Option<String>
}

impl Cli {
    fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            batch_size: self.batch_size,
            max_workers: self.max_workers,
            max_message_retries: self.max_message_retries,
            max_field_retries: self.max_field_retries,
            strategy: self.strategy,
            field_retry_delay: Duration::from_millis(self.field_retry_delay_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms)
        }
    }

    fn backends(&self) -> Result<Backends> {
        let request_timeout = Duration::from_millis(self.request_timeout_ms);
        let parallel = OllamaBackend::new(&self.parallel_model, Some(self.ollama_url.clone()), request_timeout)?;
        let single = OllamaBackend::new(&self.single_model, Some(self.ollama_url.clone()), request_timeout)?;

        info!("Per-field agents use [{}], batch agent uses [{}] at {}", parallel.model(), single.model(), self.ollama_url);

        Ok(Backends {
            parallel: Some(Arc::new(parallel) as Arc<dyn InferenceBackend>),
            single: Some(Arc::new(single) as Arc<dyn InferenceBackend>)
        })
    }
}

#[derive(Serialize)]
struct OutputRow<'a> {
    transaction_id: &'a str,
    transaction_date: String,
    amount: String,
    #[serde(rename = "type")]
    transaction_type: String,
    available_balance: String
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let config = cli.extraction_config();
    let pipeline = ExtractionPipeline::new(cli.backends()?);

    if cli.diagnostics {
        let diagnostics = pipeline.diagnostics(&config).await;
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        return Ok(())
    }

    let input = cli.input.clone().ok_or_else(|| anyhow!("An input CSV is required"))?;
    let messages = read_messages(input).await?;

    if let Some(message_id) = &cli.inspect {
        let message = messages.iter()
            .find(|message| &message.id == message_id)
            .ok_or_else(|| anyhow!("Message [{message_id}] is not in the input"))?;
        let extractor = pipeline.single_agent().ok_or_else(|| anyhow!("No batch agent backend configured"))?;

        println!("{}", serde_json::to_string_pretty(&extractor.inspect(message).await)?);
        return Ok(())
    }

    let timer = Instant::now();
    let report = pipeline.process(messages, &config).await?;
    let summary = report.summary();

    info!(
        "Processed messages with [{}] in: {:?} (submitted: {}, succeeded: {}, dropped: {})",
        report.tier,
        timer.elapsed(),
        summary.submitted,
        summary.succeeded,
        summary.dropped
    );

    let storage = MemoryTransactionStore::new();
    let saved = storage.save(&cli.user, &report.records)?;

    info!("Saved {saved} transactions for user [{}]", cli.user);

    write_results_to_stdout(&storage.read(&cli.user)?)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the CSV output, so logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

/// Reads messages on a blocking thread; rows that cannot be used are logged and skipped.
async fn read_messages(path: PathBuf) -> Result<Vec<RawMessage>> {
    spawn_blocking(move || {
        let file = File::open(&path).with_context(|| format!("Error opening CSV at path: {}", path.display()))?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut messages = Vec::new();
        let mut seen = HashSet::new();

        for result in reader.deserialize::<RawMessage>() {
            let message = match result {
                Ok(message) => message,
                Err(error) => {
                    error!("CSV deserialization error: {error}");
                    continue
                }
            };

            if let Err(error) = message.validate() {
                error!("Skipping message: {error}");
                continue
            }

            if !seen.insert(message.id.clone()) {
                error!("Skipping repeated message [{}]", message.id);
                continue
            }

            messages.push(message);
        }

        Ok::<_, anyhow::Error>(messages)
    }).await?
}

fn write_results_to_stdout(records: &[TransactionRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(stdout().lock()));

    //NOTE: written by hand so the header is present even when there are no records
    writer.write_record(["transaction_id", "transaction_date", "amount", "type", "available_balance"])?;

    for record in records {
        writer.serialize(OutputRow {
            transaction_id: &record.transaction_id,
            transaction_date: record.transaction_date.format(DATE_FORMAT).to_string(),
            amount: record.amount.to_string(),
            transaction_type: record.transaction_type.to_string(),
            available_balance: record.available_balance.to_string()
        })?;
    }

    writer.flush()?;

    Ok(())
}
