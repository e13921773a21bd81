// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sortwatch CLI
//!
//! Command-line interface for the sortwatch benchmark service.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Sortwatch - Instrumented sorting benchmark service
#[derive(Parser)]
#[command(name = "sortwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "sortwatch.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Serve,

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// Run all sorters on a list and print the results
    Bench {
        /// Comma-separated numbers, e.g. 5,3,8,1
        #[arg(short, long, value_delimiter = ',', num_args = 1.., allow_hyphen_values = true)]
        list: Vec<String>,
    },

    /// Summarize the persisted telemetry
    Stats {
        /// Show host load instead of request latency
        #[arg(long)]
        host: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve => commands::serve::execute(&cli.config).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Bench { list } => commands::bench::execute(&cli.config, &list).await,
        Commands::Stats { host } => commands::stats::execute(&cli.config, host).await,
    }
}
