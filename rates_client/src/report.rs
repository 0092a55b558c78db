//! One-shot N-day report, printed locally instead of broadcast.
//!
//! Runs the same `RangeAggregator` as the server, then narrows the output to the
//! selected currencies. EUR and USD are always selected.
use rates_common::RangeReport;
use rates_common::format::error_line;
use rates_common::rate::format_date;
use std::collections::BTreeSet;

/// Currencies included in every report.
pub const DEFAULT_CURRENCIES: [&str; 2] = ["EUR", "USD"];

/// Every currency code that appears on at least one successful day, sorted.
pub fn available_currencies(range: &RangeReport) -> BTreeSet<String> {
    range
        .days()
        .iter()
        .filter_map(|day| day.outcome.as_ref().ok())
        .flatten()
        .map(|record| record.currency.clone())
        .collect()
}

/// User-chosen currencies followed by the defaults, without duplicates.
pub fn selected_currencies(chosen: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    let requested = chosen.iter().map(|c| c.trim().to_uppercase());
    for currency in requested.chain(DEFAULT_CURRENCIES.iter().map(|c| c.to_string())) {
        if !currency.is_empty() && !selected.contains(&currency) {
            selected.push(currency);
        }
    }
    selected
}

/// Report body: per date, oldest first, the date then the matching rates.
pub fn report_lines(range: &RangeReport, selected: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    for day in range.days() {
        lines.push(format_date(day.date));
        match &day.outcome {
            Ok(records) => lines.extend(
                records
                    .iter()
                    .filter(|r| selected.contains(&r.currency))
                    .map(|r| {
                        format!(
                            "Currency: {}, Sale Rate: {}, Purchase Rate: {}",
                            r.currency, r.sell, r.buy
                        )
                    }),
            ),
            Err(e) => lines.push(error_line(day, e)),
        }
    }
    lines
}
