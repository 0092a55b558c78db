//! Rates Client: talks to the exchange-rate broadcast server, or builds a report on
//! its own.
//!
//! Usage example (CLI):
//! ```bash
//! rates_client chat --server 192.168.0.10:8080
//! rates_client report --days 5 --currencies PLN CHF
//! ```
//!
//! In `chat` mode every stdin line is sent as a command (`exchange`, `ecd <n>`) and every
//! line the server pushes, including broadcasts triggered by other clients, is printed.
//! `report` runs the concurrent N-day aggregation locally, with no server involved.
#![warn(missing_docs)]
mod args;
mod report;
mod sender;

use crate::args::{Args, Mode};
use crate::report::{available_currencies, report_lines, selected_currencies};
use crate::sender::{CommandSender, receive_loop};
use clap::Parser;
use log::{error, info};
use rates_common::{RangeAggregator, RateFetcher, RatesError, Result};
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

fn run_chat(server: &str) -> Result<(), RatesError> {
    info!("Connecting to rates server at {}", server);
    let stream = TcpStream::connect(server)
        .map_err(|e| RatesError::Format(format!("Failed to connect to server: {}", e)))?;

    {
        let stream = stream.try_clone()?;
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            let _ = stream.shutdown(Shutdown::Both);
        })
        .map_err(|e| RatesError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let mut outbound = stream.try_clone()?;
    thread::spawn(move || {
        let stdin = io::stdin();
        match CommandSender::forward(stdin.lock(), &mut outbound) {
            Ok(sent) => info!("Input closed after {} command(s)", sent),
            Err(e) => error!("Sending error to server: {}", e),
        }
        let _ = outbound.shutdown(Shutdown::Write);
    });

    info!("Connected. Type `exchange` or `ecd <days>`; Ctrl+C to exit.");
    let mut stdout = io::stdout().lock();
    match receive_loop(&stream, &mut stdout) {
        Ok(_) => Ok(()),
        // Ctrl+C shuts the socket down under the reader.
        Err(RatesError::Io(e)) if e.kind() == io::ErrorKind::ConnectionAborted => Ok(()),
        Err(e) => Err(e),
    }
}

fn run_report(
    days: i64,
    currencies: &[String],
    api_url: &str,
    fetch_timeout_secs: u64,
) -> Result<(), RatesError> {
    let started = Instant::now();
    let fetcher = RateFetcher::new(api_url, Duration::from_secs(fetch_timeout_secs))?;
    let range = RangeAggregator::new(Box::new(fetcher))
        .aggregate(days)
        .map_err(|e| RatesError::Format(e.to_string()))?;
    info!("Fetched {} day(s) in {:.3?}", range.len(), started.elapsed());

    if range.days().iter().all(|day| !day.is_ok()) {
        println!("Failed to retrieve exchange rate data for the selected days.");
        for line in report_lines(&range, &[]) {
            println!("{}", line);
        }
        return Ok(());
    }

    let available: Vec<String> = available_currencies(&range).into_iter().collect();
    println!("Available currencies: {}", available.join(", "));
    let selected = selected_currencies(currencies);
    println!("Selected currencies: {}", selected.join(", "));

    let mut stdout = io::stdout().lock();
    for line in report_lines(&range, &selected) {
        writeln!(stdout, "{}", line)?;
    }
    info!("Report done in {:.3?}", started.elapsed());
    Ok(())
}

fn main() -> Result<(), RatesError> {
    init_logger();
    let args = Args::parse();
    match args.mode {
        Mode::Chat { server } => run_chat(server.trim()),
        Mode::Report {
            days,
            currencies,
            api_url,
            fetch_timeout_secs,
        } => run_report(days, &currencies, &api_url, fetch_timeout_secs),
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
