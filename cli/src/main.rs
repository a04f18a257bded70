// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Pluto Hub CLI
//!
//! The `pluto` binary derives per-user isolation for the notebook hub and
//! renders what the provisioning layer and the hub container need.
//!
//! ## Commands
//!
//! - `pluto config show|validate|generate` - Configuration management
//! - `pluto roster show` - Loaded users and their isolation descriptors
//! - `pluto plan` - Provisioning requests for every user
//! - `pluto env` - Hub container environment
//! - `pluto spawn-args` - Run-task arguments for one user, from the hub environment

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use pluto_hub::commands::{self, ConfigCommand, EnvArgs, PlanArgs, RosterCommand, SpawnArgs};

/// Pluto Hub - Per-user isolation for a shared notebook hub
#[derive(Parser)]
#[command(name = "pluto")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "PLUTO_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PLUTO_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Roster inspection
    #[command(name = "roster")]
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },

    /// Show the provisioning plan
    #[command(name = "plan")]
    Plan(PlanArgs),

    /// Render the hub container environment
    #[command(name = "env")]
    Env(EnvArgs),

    /// Print run-task arguments for a user's notebook server
    #[command(name = "spawn-args")]
    SpawnArgs(SpawnArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        Some(Commands::Roster { command }) => commands::roster::handle_command(command, cli.config).await,
        Some(Commands::Plan(args)) => commands::plan::execute(args, cli.config).await,
        Some(Commands::Env(args)) => commands::env::execute(args, cli.config).await,
        Some(Commands::SpawnArgs(args)) => commands::spawn::execute(args).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
