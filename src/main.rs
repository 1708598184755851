//! Runeforge - Curation pipeline for operator knowledge
//!
//! Thin process wiring around the library: parse a command, load the TOML
//! configuration, run one pipeline operation, print the result as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use runeforge::{
    classify::Domain,
    config::{RuneforgeConfig, StorageConfig},
    curation::ReviewDecision,
    input::RawInput,
    pipeline::CurationPipeline,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "runeforge")]
#[command(version)]
#[command(about = "Curation pipeline that distills operator interactions into approved capability artifacts")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RUNEFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one raw input (JSON document from a file or stdin)
    Ingest {
        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List a domain's approved capabilities
    Capabilities {
        /// Domain id (e.g. cluster-operations)
        domain: Domain,
    },

    /// List open approval requests
    Pending,

    /// Resolve an approval request
    Resolve {
        /// Approval request id
        id: Uuid,

        /// Approve instead of reject
        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Reject instead of approve
        #[arg(long)]
        reject: bool,

        /// Reviewer feedback
        #[arg(short, long)]
        feedback: Option<String>,
    },

    /// Re-submit a rejected artifact for review
    Reopen {
        /// Orb id
        orb_id: Uuid,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("runeforge={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)?;
        toml::from_str(&content)?
    } else {
        RuneforgeConfig::default()
    };
    if config.storage.data_dir.is_none() {
        config.storage.data_dir = Some(StorageConfig::default_dir());
    }

    match cli.command {
        Commands::Ingest { file } => {
            let json = match file {
                Some(path) => std::fs::read_to_string(&path)?,
                None => {
                    use tokio::io::AsyncReadExt;
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            let input = RawInput::from_json(&json)?;
            let pipeline = CurationPipeline::new(&config).await?;
            let outcome = pipeline.ingest(input).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Capabilities { domain } => {
            let pipeline = CurationPipeline::new(&config).await?;
            let capabilities = pipeline.get_capabilities(domain).await;
            println!("{}", serde_json::to_string_pretty(&capabilities)?);
        }
        Commands::Pending => {
            let pipeline = CurationPipeline::new(&config).await?;
            let pending = pipeline.list_pending().await;
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
        Commands::Resolve {
            id,
            approve,
            reject,
            feedback,
        } => {
            let decision = match (approve, reject) {
                (true, false) => ReviewDecision::Approved,
                (false, true) => ReviewDecision::Rejected,
                _ => anyhow::bail!("pass exactly one of --approve or --reject"),
            };
            let pipeline = CurationPipeline::new(&config).await?;
            let orb = pipeline.resolve(id, decision, feedback).await?;
            println!("{}", serde_json::to_string_pretty(&orb)?);
        }
        Commands::Reopen { orb_id } => {
            let pipeline = CurationPipeline::new(&config).await?;
            let request = pipeline.reopen(orb_id).await?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Commands::Config { default } => {
            let config = if default {
                RuneforgeConfig::default()
            } else {
                config
            };
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
