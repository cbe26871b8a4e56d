use anyhow::Context;
use blindmatch::{
    Attribute, AttributeFailure, Encoded, Encoder, EngineConfig, IdentityId, IndexCatalog, IndexStore, LookupOutcome,
    LookupResponse, LookupStats, MemoryStore, Resolver, ScoringPolicy, SecretKey, KEY_FILE_ENV,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Privacy-preserving identity resolution
#[derive(Parser, Debug)]
#[command(name = "blindmatch")]
#[command(about = "Encode demographic attributes and resolve identities", long_about = None)]
struct Args {
    /// Engine configuration (index catalog and scoring policy)
    #[arg(short, long, global = true, default_value = "./blindmatch.json")]
    config: PathBuf,

    /// Secret key file; falls back to the BLINDMATCH_KEY_FILE env var
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode one set of attributes and print the artifacts
    Encode {
        /// JSON array of attributes
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Enroll a population and look up one query against it
    Lookup {
        /// JSON array of `{ "id": ..., "attributes": [...] }`; a missing id gets a random UUID
        #[arg(short, long)]
        population: PathBuf,

        /// JSON array of attributes
        #[arg(short, long)]
        query: PathBuf,

        /// Lookup deadline in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
}

#[derive(Deserialize)]
struct PopulationEntry {
    #[serde(default = "IdentityId::new_v4")]
    id: IdentityId,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Serialize)]
struct LookupReport {
    encoded: bool,
    timed_out: bool,
    enrolled: usize,
    failures: Vec<AttributeFailure>,
    stats: LookupStats,
    #[serde(flatten)]
    response: LookupResponse,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn load_key(key_file: Option<&Path>) -> anyhow::Result<SecretKey> {
    let key = match key_file {
        Some(path) => SecretKey::from_file(path)?,
        None => SecretKey::from_env(KEY_FILE_ENV)?,
    };
    Ok(key)
}

fn run_encode(encoder: &Encoder, catalog: &IndexCatalog, input: &Path) -> anyhow::Result<Encoded> {
    let attributes: Vec<Attribute> = read_json(input)?;
    Ok(encoder.encode(attributes, catalog)?)
}

async fn run_lookup(
    encoder: Encoder,
    catalog: Arc<IndexCatalog>,
    policy: ScoringPolicy,
    population: &Path,
    query: &Path,
    deadline: Duration,
) -> anyhow::Result<LookupReport> {
    let store = Arc::new(MemoryStore::new(Arc::clone(&catalog)));
    let resolver = Resolver::new(encoder, catalog, policy, store);

    let entries: Vec<PopulationEntry> = read_json(population)?;
    let mut skipped = 0usize;
    for entry in entries {
        let id = entry.id.clone();
        match resolver.enroll(entry.id, entry.attributes) {
            Ok(failures) if !failures.is_empty() => {
                warn!(%id, failures = failures.len(), "Enrolled with unusable attributes");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%id, error = %e, "Skipping identity");
                skipped += 1;
            }
        }
    }
    let enrolled = resolver.store().count();
    info!(enrolled, skipped, "Population enrolled");

    let attributes: Vec<Attribute> = read_json(query)?;
    let outcome = resolver.resolve(attributes, deadline).await?;

    let encoded = !matches!(outcome, LookupOutcome::UnableToEncode { .. });
    let timed_out = outcome.timed_out();
    let compared = outcome.compared();
    let (candidates, failures) = match outcome {
        LookupOutcome::Matches { candidates, failures, .. } => (candidates, failures),
        LookupOutcome::UnableToEncode { failures } | LookupOutcome::NoCandidates { failures, .. } => {
            (Vec::new(), failures)
        }
    };

    Ok(LookupReport {
        encoded,
        timed_out,
        enrolled,
        failures,
        stats: LookupStats::compute(&candidates, compared),
        response: LookupResponse::from_ranked(candidates),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting blindmatch v{}", env!("CARGO_PKG_VERSION"));

    let (catalog, policy) = EngineConfig::from_file(&args.config)
        .and_then(EngineConfig::build)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let catalog = Arc::new(catalog);
    info!(indexes = catalog.len(), "Configuration loaded");

    let encoder = Encoder::new(load_key(args.key_file.as_deref())?)?;

    match args.command {
        Command::Encode { input } => {
            let encoded = run_encode(&encoder, &catalog, &input)?;
            println!("{}", serde_json::to_string_pretty(&encoded)?);
        }
        Command::Lookup {
            population,
            query,
            timeout_ms,
        } => {
            let report = run_lookup(
                encoder,
                catalog,
                policy,
                &population,
                &query,
                Duration::from_millis(timeout_ms),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
