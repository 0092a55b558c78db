//! Concurrent N-day aggregation.
//!
//! `RangeAggregator::aggregate(days)` fans out one `RateSource::fetch` per date on its
//! own scoped thread, waits for all of them, and fans the results back in by date
//! index. Completion order is whatever the upstream makes it; output order is always
//! oldest date first. A failed date keeps its slot and carries its error.
use std::thread;

use chrono::{Days, Local, NaiveDate};
use crossbeam_channel::unbounded;
use log::{debug, error, info};

use crate::error::{CommandError, FetchError};
use crate::fetcher::RateSource;
use crate::rate::{DailyReport, RangeReport, format_date};

/// The `days` calendar dates ending at `today` (inclusive), oldest first.
///
/// Dates before the calendar's minimum are skipped rather than wrapping.
pub fn date_range(today: NaiveDate, days: usize) -> impl Iterator<Item = NaiveDate> {
    (0..days as u64)
        .rev()
        .filter_map(move |back| today.checked_sub_days(Days::new(back)))
}

/// Fan-out/fan-in driver over a `RateSource`.
pub struct RangeAggregator<S: ?Sized> {
    source: Box<S>,
}

impl<S: RateSource + ?Sized> RangeAggregator<S> {
    /// Aggregate over `source`.
    pub fn new(source: Box<S>) -> Self {
        Self { source }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Rates for the `days` days ending today (local time).
    pub fn aggregate(&self, days: i64) -> Result<RangeReport, CommandError> {
        self.aggregate_until(Local::now().date_naive(), days)
    }

    /// Rates for the `days` days ending at `today`.
    ///
    /// Fails with `InvalidArgument` for `days < 1`, before any fetch is issued.
    pub fn aggregate_until(&self, today: NaiveDate, days: i64) -> Result<RangeReport, CommandError> {
        if days < 1 {
            return Err(CommandError::InvalidArgument(days));
        }
        let count = usize::try_from(days).map_err(|e| CommandError::Parse(e.to_string()))?;
        let dates: Vec<NaiveDate> = date_range(today, count).collect();
        info!(
            "Fetching {} day(s) from {} to {}",
            dates.len(),
            dates.first().map(|d| format_date(*d)).unwrap_or_default(),
            format_date(today)
        );
        Ok(self.fetch_all(&dates))
    }

    /// The report for a single `date`.
    pub fn day(&self, date: NaiveDate) -> DailyReport {
        self.source.fetch(date)
    }

    fn fetch_all(&self, dates: &[NaiveDate]) -> RangeReport {
        let (tx, rx) = unbounded::<(usize, DailyReport)>();
        let source = &self.source;

        let mut slots: Vec<Option<DailyReport>> = vec![None; dates.len()];
        thread::scope(|scope| {
            let workers: Vec<_> = dates
                .iter()
                .copied()
                .enumerate()
                .map(|(index, date)| {
                    let tx = tx.clone();
                    scope.spawn(move || {
                        let report = source.fetch(date);
                        // The receiver outlives the scope, so this cannot fail.
                        let _ = tx.send((index, report));
                    })
                })
                .collect();
            drop(tx);

            for (index, report) in rx.iter() {
                debug!("Fetch #{} for {} completed", index, format_date(report.date));
                slots[index] = Some(report);
            }
            // Joining here keeps a panicking worker from tearing down the whole scope.
            for worker in workers {
                if worker.join().is_err() {
                    error!("Fetch worker panicked");
                }
            }
        });

        let days = slots
            .into_iter()
            .zip(dates)
            .map(|(slot, date)| {
                slot.unwrap_or_else(|| {
                    error!("Fetch worker for {} exited without a result", format_date(*date));
                    DailyReport::failed(
                        *date,
                        FetchError::Transport(String::from("fetch worker panicked")),
                    )
                })
            })
            .collect();
        RangeReport::from_ordered(days)
    }
}
