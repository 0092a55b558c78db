//! Exchange-rate broadcast server.
//!
//! This binary accepts TCP clients speaking a newline-delimited text protocol and
//! answers rate requests to everyone connected. It wires together:
//!
//! - `CommandListener`: accepts connections and spawns one session thread per client.
//! - `session`: per-client reader loop plus a writer thread draining that client's
//!   outbound channel; registration is scoped so every exit path unregisters.
//! - `ConnectionRegistry`: the live connection set; broadcast snapshots it and
//!   delivers every line to every member, isolating per-client failures.
//! - `BroadcastServer`: parses `exchange` / `ecd <n>`, runs the `RateFetcher` or the
//!   concurrent `RangeAggregator`, and broadcasts the formatted lines.
//!
//! Protocol (high-level):
//! - `exchange`: today's rates, broadcast.
//! - `ecd <n>`: the last `n` days (today included), oldest first, broadcast. A bad `n`
//!   is answered to the sender only.
//! - Anything else is ignored.
#![warn(missing_docs)]
use crate::args::Args;
use crate::dispatcher::BroadcastServer;
use crate::listener::CommandListener;
use crate::model::registry::ConnectionRegistry;
use clap::Parser;
use log::info;
use rates_common::{RateFetcher, RatesError, Result};
use std::sync::Arc;
use std::time::Duration;

mod args;
mod dispatcher;
mod listener;
pub mod model;
mod session;

fn main() -> Result<(), RatesError> {
    init_logger();
    let args = Args::parse();
    info!(
        "Upstream: {} (timeout {}s), max {} day(s) per request",
        args.api_url, args.fetch_timeout_secs, args.max_days
    );

    let fetcher = RateFetcher::new(&args.api_url, Duration::from_secs(args.fetch_timeout_secs))?;
    let registry = Arc::new(ConnectionRegistry::new());
    let server = Arc::new(BroadcastServer::new(
        registry,
        Box::new(fetcher),
        args.max_days,
    ));

    CommandListener::new(&args.bind)?.accept_loop(server)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
