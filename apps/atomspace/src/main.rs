//! # AtomSpace - Hypergraph Server
//!
//! The main binary for the AtomSpace hypergraph store.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for scripts and configuration
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │          apps/atomspace (THE BINARY)          │
//! │                                               │
//! │  ┌─────────────┐        ┌─────────────┐       │
//! │  │    CLI      │        │  HTTP API   │       │
//! │  │   (clap)    │        │   (axum)    │       │
//! │  └──────┬──────┘        └──────┬──────┘       │
//! │         └────────────┬─────────┘              │
//! │                      ▼                        │
//! │             ┌────────────────┐                │
//! │             │ atomspace-core │                │
//! │             │  (THE LOGIC)   │                │
//! │             └────────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! atomspace --config atomspace.toml server --port 8080
//!
//! # Run a script of types, atoms and queries
//! atomspace run -f script.json --json-mode
//! ```

use atomspace::cli::{self, Cli};
use atomspace::config::{Config, LogFormat};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &Config, verbose: bool) {
    let fallback = if verbose {
        "atomspace=debug,atomspace_core=debug,tower_http=debug"
    } else {
        config.logging.filter.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the AtomSpace startup banner.
fn print_banner() {
    println!(
        r#"
   _  _                ___
  /_\| |_ ___ _ __    / __|_ __  __ _ __ ___
 / _ \  _/ _ \ '  \   \__ \ '_ \/ _` / _/ -_)
/_/ \_\__\___/_|_|_|  |___/ .__/\__,_\__\___|
                          |_|
  Hypergraph Store v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
