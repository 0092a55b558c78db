//!
//! Common types and utilities shared by the exchange-rate server and client.
//!
//! This crate aggregates:
//! - `error`: `RatesError`, per-date `FetchError`, and user-input `CommandError`.
//! - `result`: handy `Result<T, RatesError>` alias.
//! - `rate`: `RateRecord`, `DailyReport`, and `RangeReport`.
//! - `command`: the `exchange` / `ecd <n>` text command grammar.
//! - `fetcher`: one upstream HTTP lookup per date (`RateFetcher`, `RateSource`).
//! - `aggregator`: concurrent N-day fan-out with date-ordered fan-in.
//! - `format`: rendering of reports into protocol lines.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod aggregator;
pub mod command;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod net;
pub mod rate;
pub mod result;

pub use aggregator::RangeAggregator;
pub use command::Command;
pub use error::{CommandError, FetchError, RatesError};
pub use fetcher::{RateFetcher, RateSource};
pub use rate::{DailyReport, RangeReport, RateRecord};
pub use result::Result;
