//! Command-line arguments for the rates server.
use clap::Parser;
use rates_common::net::{COMMAND_PORT, DEFAULT_API_URL, DEFAULT_FETCH_TIMEOUT_SECS, addr};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to accept client connections on.
    #[clap(long, default_value_t = addr("0.0.0.0", COMMAND_PORT))]
    pub bind: String,

    /// Upstream exchange-rate endpoint; `&date=DD.MM.YYYY` is appended per request.
    #[clap(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Timeout for a single upstream request, in seconds.
    #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Largest day count accepted by `ecd <n>`.
    #[clap(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..))]
    pub max_days: i64,
}
