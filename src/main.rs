//! # Triage Harness CLI (`triage`)
//!
//! ## Usage
//!
//! ```bash
//! triage --config ./config/triage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `triage kb` | Load the knowledge base and print a summary |
//! | `triage context --pet pet.json` | Print the clinical context payload for a pet |
//! | `triage export` | Write the knowledge base as a bundled JSON asset |
//! | `triage serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # What did the loader find?
//! triage kb --config ./config/triage.toml
//!
//! # Context for a senior labrador with two symptoms, in Spanish
//! triage context --pet ./pet.json --symptom vomiting --symptom lethargy --lang es
//!
//! # Bundle for deployments without the YAML tree
//! triage export --output ./dist/knowledgeBase.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{warn, Level};

use triage_harness::cache::KnowledgeBaseCache;
use triage_harness::config::{load_config, Config};
use triage_harness::context::ContextBuilder;
use triage_harness::export::run_export;
use triage_harness::server::run_server;
use triage_harness::sources::create_source;
use triage_harness::stats::run_stats;

const DEFAULT_CONFIG: &str = "./config/triage.toml";

/// Triage Harness CLI: veterinary knowledge-base loading and clinical
/// context building for a symptom-triage chat agent.
#[derive(Parser)]
#[command(name = "triage", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/triage.toml`; when that default file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at DEBUG level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the knowledge base and print counts, groups and duplicate ids.
    Kb,

    /// Build the context payload for a pet profile and print it as JSON.
    Context {
        /// Pet profile JSON file, or `-` for stdin.
        #[arg(long)]
        pet: PathBuf,

        /// Symptom key; repeat for several.
        #[arg(long = "symptom")]
        symptoms: Vec<String>,

        /// Language tag (e.g. `es`, `en`).
        #[arg(long)]
        lang: Option<String>,

        /// User level filter, or `all`.
        #[arg(long)]
        level: Option<String>,
    },

    /// Write the knowledge base as a bundled JSON asset.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Kb => run_stats(&config).await?,
        Commands::Context {
            pet,
            symptoms,
            lang,
            level,
        } => {
            let pet = read_pet(&pet)?;
            let cache = Arc::new(KnowledgeBaseCache::new(create_source(&config)?));
            let builder = ContextBuilder::new(cache, &config.context);
            let payload = builder
                .build_json(&pet, &symptoms, lang.as_deref(), level.as_deref())
                .await;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Export { output } => run_export(&config, output.as_deref()).await?,
        Commands::Serve => run_server(&config).await?,
    }

    Ok(())
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if path.exists() {
                load_config(path)
            } else {
                warn!(path = DEFAULT_CONFIG, "config file not found, using defaults");
                Ok(Config::minimal())
            }
        }
    }
}

fn read_pet(path: &Path) -> Result<serde_json::Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read pet profile from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pet profile: {}", path.display()))?
    };
    serde_json::from_str(&text).context("Pet profile is not valid JSON")
}
