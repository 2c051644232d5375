//! Satchel - session lifecycle engine
//!
//! Main entry point for the Satchel CLI. Each invocation runs one request
//! cycle against the configured session store.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use commands::{config, cycle, purge};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Satchel - pooled sessions over pluggable TTL storage
#[derive(Parser)]
#[command(name = "satchel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Session token presented by the client for this cycle
    #[arg(short, long, global = true, env = "SATCHEL_TOKEN")]
    pub token: Option<String>,

    /// Config file to load instead of discovering satchel.toml
    #[arg(long, global = true, env = "SATCHEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use a file storage backend in this directory
    #[arg(long, global = true, env = "SATCHEL_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set a key in the session and save it
    Set(cycle::SetArgs),

    /// Show the session, or one key of it
    Get(cycle::GetArgs),

    /// Remove a key from the session and save it
    Delete(cycle::DeleteArgs),

    /// Destroy the session and revoke its cookie
    Destroy,

    /// Rotate the session identifier
    Regenerate,

    /// Remove expired sessions from file storage
    Purge,

    /// Configuration inspection
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match cli.config {
        Some(ref path) => {
            let config = satchel_config::load_config_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            config.validate()?;
            satchel_config::LoadedConfig {
                config,
                sources: vec![satchel_config::ConfigSource {
                    path: path.clone(),
                    loaded: true,
                }],
                warnings: Vec::new(),
            }
        }
        None => satchel_config::load_config(None)?,
    };

    init_tracing(cli.verbose, &loaded.config.logging());

    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let ctx = commands::Context {
        config: loaded.config,
        sources: loaded.sources,
        token: cli.token,
        storage_dir: cli.storage_dir,
        json_output: cli.json,
    };

    match cli.command {
        Commands::Set(args) => cycle::set(args, &ctx),
        Commands::Get(args) => cycle::get(args, &ctx),
        Commands::Delete(args) => cycle::delete(args, &ctx),
        Commands::Destroy => cycle::destroy(&ctx),
        Commands::Regenerate => cycle::regenerate(&ctx),
        Commands::Purge => purge::run(&ctx),
        Commands::Config(args) => config::run(args, &ctx),
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays
/// machine-readable.
fn init_tracing(verbose: bool, logging: &satchel_config::LoggingConfig) {
    let default_filter = if verbose {
        "satchel=debug,satchel_session=debug,satchel_config=debug,info"
    } else {
        "satchel=info,satchel_session=warn,satchel_config=warn,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.filter.as_deref().unwrap_or(default_filter))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
