//! initiative-forge command line.
//!
//! Usage:
//!   initiative-forge --seed snapshot.json gaps request.json --table
//!   initiative-forge --seed snapshot.json drafts request.json
//!   initiative-forge charter charter.json
//!   initiative-forge validate draft.json
//!   initiative-forge --seed snapshot.json transfer transfer.json

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use initiative_forge::assessment::GatherRequest;
use initiative_forge::charter::CharterRequest;
use initiative_forge::clients::create_generator;
use initiative_forge::config::{Config, RuntimeConfig, StorageBackend, load_dotenv};
use initiative_forge::model::{Gap, InitiativeDraft, SynthesisMode};
use initiative_forge::store::{MemoryStore, SurrealStore};
use initiative_forge::synthesis::tables::humanize;
use initiative_forge::transfer::TransferRequest;
use initiative_forge::{DraftRequest, InitiativePipeline, PipelineStores};
use prettytable::{Table, row};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "initiative-forge")]
#[command(about = "Assessment gaps to initiatives and charters", long_about = None)]
struct Cli {
    /// JSON snapshot to seed the in-memory store
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gather assessments and print the consolidated gaps
    Gaps {
        /// Gather request JSON
        request: PathBuf,
        /// Legacy thresholding (gaps above the configured minimum only)
        #[arg(long)]
        legacy: bool,
        /// Print a table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Generate and store draft initiatives
    Drafts { request: PathBuf },
    /// Compose a full charter
    Charter { request: PathBuf },
    /// Validate one draft
    Validate { draft: PathBuf },
    /// Approve and transfer a batch of drafts into a project
    Transfer { request: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry RUST_LOG, so it is read before the subscriber is built.
    // Logs go to stderr so stdout stays machine readable
    load_dotenv();
    let log_level = RuntimeConfig::load_from_env().log_level;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load().context("failed to load configuration")?;

    let cli = Cli::parse();
    let seed = cli.seed.as_deref();

    match cli.command {
        Commands::Gaps {
            request,
            legacy,
            table,
        } => {
            let request: GatherRequest = read_json(&request)?;
            let frameworks = external_frameworks(&request);
            let pipeline = build_pipeline(&config, seed, &frameworks).await?;
            let assessments = pipeline.gather(&request).await?;
            let mode = if legacy {
                SynthesisMode::Theme
            } else {
                SynthesisMode::Gap
            };
            let gaps = pipeline.consolidate(&assessments, mode);
            if table {
                print_gap_table(&gaps);
            } else {
                print_json(&gaps)?;
            }
        }
        Commands::Drafts { request } => {
            let request: DraftRequest = read_json(&request)?;
            let frameworks = external_frameworks(&request.gather);
            let pipeline = build_pipeline(&config, seed, &frameworks).await?;
            let batch = pipeline.generate_drafts(&request).await?;
            print_json(&batch)?;
        }
        Commands::Charter { request } => {
            let request: CharterRequest = read_json(&request)?;
            let pipeline = build_pipeline(&config, seed, &[]).await?;
            let charter = pipeline.compose_charter(&request).await?;
            print_json(&charter)?;
        }
        Commands::Validate { draft } => {
            let draft: InitiativeDraft = read_json(&draft)?;
            let pipeline = build_pipeline(&config, seed, &[]).await?;
            print_json(&pipeline.validate(&draft))?;
        }
        Commands::Transfer { request } => {
            let request: TransferRequest = read_json(&request)?;
            let pipeline = build_pipeline(&config, seed, &[]).await?;
            let report = pipeline.transfer(request).await?;
            print_json(&report)?;
        }
    }
    Ok(())
}

async fn build_pipeline(
    config: &Config,
    seed: Option<&Path>,
    frameworks: &[String],
) -> Result<InitiativePipeline> {
    let stores = match config.storage.backend {
        StorageBackend::Memory => {
            let store = match seed {
                Some(path) => MemoryStore::from_json_file(path)
                    .await
                    .with_context(|| format!("failed to seed store from {}", path.display()))?,
                None => MemoryStore::new(),
            };
            PipelineStores::from_memory(Arc::new(store)).await
        }
        StorageBackend::Surreal => {
            let store = SurrealStore::connect(&config.storage, &config.runtime)
                .await
                .context("failed to connect to SurrealDB")?;
            PipelineStores::from_surreal(store, frameworks)
        }
    };
    let generator = create_generator(config);
    info!(
        "pipeline ready ({:?} storage, generation {})",
        config.storage.backend,
        if generator.is_some() { "on" } else { "off" }
    );
    Ok(InitiativePipeline::new(config.clone(), stores, generator))
}

fn external_frameworks(request: &GatherRequest) -> Vec<String> {
    request.external.iter().map(|e| e.framework.clone()).collect()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_gap_table(gaps: &[Gap]) {
    let mut table = Table::new();
    table.add_row(row![
        "Dimension",
        "Source",
        "As-is",
        "To-be",
        "Gap",
        "Priority",
        "Severity"
    ]);
    for g in gaps {
        table.add_row(row![
            humanize(&g.dimension),
            g.source,
            g.as_is,
            g.to_be,
            g.gap_size,
            g.priority_score,
            format!("{:?}", g.severity()),
        ]);
    }
    table.printstd();
}
