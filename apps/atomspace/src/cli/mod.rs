//! # AtomSpace CLI Module
//!
//! This module implements the CLI interface for AtomSpace.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `run` - Execute a JSON script (types, atoms, queries) against a fresh store
//! - `types` - Show the configured type hierarchy
//! - `config` - Print the effective configuration as TOML

mod commands;

use crate::config::Config;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// AtomSpace - typed hypergraph store with pattern matching
#[derive(Parser, Debug)]
#[command(name = "atomspace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a JSON script against a fresh store
    Run {
        /// Path to the script file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the configured type hierarchy
    Types,

    /// Print the effective configuration
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: Config) -> Result<(), AppError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config, host, port).await,
        Some(Commands::Run { file }) => cmd_run(&config, &file, json_mode),
        Some(Commands::Config) => cmd_config(&config),
        Some(Commands::Types) | None => cmd_types(&config, json_mode),
    }
}
