//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files were considered and loaded
    Which,

    /// Show the user config file path
    Path,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    // Materialize defaults so the output shows effective values
    let resolved = satchel_config::SatchelConfig {
        session: Some(ctx.config.session()),
        storage: Some(ctx.config.storage()),
        logging: Some(ctx.config.logging()),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        print!("{}", resolved.to_toml()?);
    }
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    if ctx.sources.is_empty() {
        println!("No config files considered (using defaults)");
        return Ok(());
    }

    for source in &ctx.sources {
        let status = if source.loaded { "loaded" } else { "not found" };
        println!("  {:<10} {}", status, source.path.display());
    }
    Ok(())
}

fn cmd_path() -> Result<()> {
    match satchel_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("No user config directory on this platform"),
    }
    Ok(())
}
