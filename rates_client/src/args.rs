//! Command-line arguments for the rates client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::{Parser, Subcommand};
use rates_common::net::{COMMAND_PORT, DEFAULT_API_URL, DEFAULT_FETCH_TIMEOUT_SECS, addr};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// What to run.
    #[command(subcommand)]
    pub mode: Mode,
}

/// Client modes.
#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Connect to a rates server and exchange text commands interactively.
    Chat {
        /// Server address (`host:port`).
        #[clap(long, default_value_t = addr("127.0.0.1", COMMAND_PORT))]
        server: String,
    },
    /// Fetch the last N days directly from the upstream API and print a report.
    Report {
        /// Number of days, today included.
        #[clap(long, value_parser = clap::value_parser!(i64).range(1..=10))]
        days: i64,

        /// Currencies to show in addition to EUR and USD.
        #[clap(long, num_args = 0.., value_delimiter = ' ')]
        currencies: Vec<String>,

        /// Upstream exchange-rate endpoint.
        #[clap(long, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Timeout for a single upstream request, in seconds.
        #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
        fetch_timeout_secs: u64,
    },
}
