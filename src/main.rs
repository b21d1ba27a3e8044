use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use readiness_index::app::ports::ProvenanceSinkPort;
use readiness_index::config::Config;
use readiness_index::domain::{DatasetId, Table};
use readiness_index::infra::NdjsonLedgerSink;
use readiness_index::logging;
use readiness_index::metrics::registry::register_all_metrics;
use readiness_index::pipeline::processing::score::WeightConfig;
use readiness_index::pipeline::{ProvenanceLedger, ProvenanceQuery, ScoreSnapshot, Stage};
use readiness_index::ReadinessService;

#[derive(Parser)]
#[command(name = "readiness_index")]
#[command(about = "Regional readiness scoring with explainable rankings")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a table, score every region and print results as JSON
    Score {
        /// JSON table: {"dataset_id": .., "columns": [..], "rows": [[..], ..]}
        #[arg(long)]
        table: PathBuf,
        /// Weight config TOML; defaults to the [weights] section of the config
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Config file; falls back to READINESS_CONFIG, then defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score a table and explain a single region
    Explain {
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        region: String,
        #[arg(long)]
        weights: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Query a persisted provenance ledger
    Provenance {
        /// NDJSON ledger file
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        dataset: String,
        /// One of: validate, normalize, derive, score, explain
        #[arg(long, value_parser = parse_stage)]
        stage: Option<Stage>,
        /// RFC 3339 lower bound (inclusive)
        #[arg(long, value_parser = parse_time)]
        since: Option<DateTime<Utc>>,
        /// RFC 3339 upper bound (inclusive)
        #[arg(long, value_parser = parse_time)]
        until: Option<DateTime<Utc>>,
    },
}

fn parse_stage(value: &str) -> Result<Stage, String> {
    Stage::from_name(value).ok_or_else(|| format!("unknown stage '{}'", value))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", value, e))
}

/// Open the configured ledger, replaying any entries already on disk
async fn open_ledger(config: &Config) -> anyhow::Result<Arc<ProvenanceLedger>> {
    let Some(path) = &config.ledger.path else {
        return Ok(Arc::new(ProvenanceLedger::new()));
    };
    let entries = NdjsonLedgerSink::load(path)
        .await
        .with_context(|| format!("reading ledger {}", path.display()))?;
    info!("Replayed {} ledger entries from {}", entries.len(), path.display());
    let sink: Arc<dyn ProvenanceSinkPort> = Arc::new(NdjsonLedgerSink::new(path));
    Ok(Arc::new(ProvenanceLedger::restore(entries, Some(sink))))
}

fn read_table(path: &Path) -> anyhow::Result<Table> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading table {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing table {}", path.display()))
}

fn read_weights(path: Option<&Path>, config: &Config) -> anyhow::Result<WeightConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading weights {}", path.display()))?;
            Ok(WeightConfig::from_toml_str(&content)?)
        }
        None => Ok(config.weights.to_weight_config()),
    }
}

async fn load_and_score(
    table: &Path,
    weights: Option<&Path>,
    config: &Config,
) -> anyhow::Result<(ReadinessService, DatasetId, Arc<ScoreSnapshot>)> {
    let ledger = open_ledger(config).await?;
    let service = ReadinessService::in_memory(ledger, config.normalization.missing_value_strategy);

    let table = read_table(table)?;
    let weights = read_weights(weights, config)?;
    let dataset = service.validate_and_load(&table).await?;
    let snapshot = service.score_dataset(&dataset.id, &weights).await?;
    Ok((service, dataset.id, snapshot))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Score { config, .. } | Commands::Explain { config, .. } => config.clone(),
        Commands::Provenance { .. } => None,
    };
    let config = Config::resolve(config_path.as_deref())?;
    let _guard = logging::init_logging(&config.logging)?;

    let conflicts = register_all_metrics();
    if !conflicts.is_empty() {
        warn!("Metric name conflicts: {:?}", conflicts);
    }

    match cli.command {
        Commands::Score {
            table, weights, ..
        } => {
            let span = tracing::info_span!("score", table = %table.display());
            let _enter = span.enter();

            let (_, dataset_id, snapshot) =
                load_and_score(&table, weights.as_deref(), &config).await?;
            info!(dataset_id = %dataset_id, version = snapshot.version, "Scoring finished");
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        }
        Commands::Explain {
            table,
            region,
            weights,
            ..
        } => {
            let span = tracing::info_span!("explain", region = %region);
            let _enter = span.enter();

            let (service, dataset_id, _) =
                load_and_score(&table, weights.as_deref(), &config).await?;
            let explanation = service.explain(&dataset_id, &region).await?;
            println!("{}", serde_json::to_string_pretty(&explanation)?);
        }
        Commands::Provenance {
            ledger,
            dataset,
            stage,
            since,
            until,
        } => {
            if let (Some(since), Some(until)) = (since, until) {
                if since > until {
                    return Err(anyhow!("--since {} is after --until {}", since, until));
                }
            }
            let entries = NdjsonLedgerSink::load(&ledger).await?;
            let ledger = ProvenanceLedger::restore(entries, None);
            let filter = ProvenanceQuery {
                stage,
                since,
                until,
            };
            let matched = ledger.query(&DatasetId::from(dataset.as_str()), &filter).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "dataset_id": dataset,
                    "entries": matched,
                }))?
            );
        }
    }
    Ok(())
}
