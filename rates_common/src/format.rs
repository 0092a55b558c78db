//! Plain-text rendering of reports into protocol lines.
use crate::error::{CommandError, FetchError};
use crate::rate::{DailyReport, RangeReport, RateRecord, format_date};

/// `<CUR>: buy: <buy>, sale: <sell>`
pub fn record_line(record: &RateRecord) -> String {
    format!("{}: buy: {}, sale: {}", record.currency, record.buy, record.sell)
}

/// Header preceding each date's block in a range answer.
pub fn header_line(report: &DailyReport) -> String {
    format!(
        "Exchange rates for {}: ***===================***",
        format_date(report.date)
    )
}

/// Single line describing why a date has no records.
pub fn error_line(report: &DailyReport, error: &FetchError) -> String {
    let date = format_date(report.date);
    match error {
        FetchError::NoData => format!("No exchange rate data found for {date}."),
        FetchError::Upstream { status } => {
            format!("Error retrieving exchange rates for {date} (HTTP {status}).")
        }
        FetchError::Transport(description) => format!("Error: {description}"),
    }
}

/// Record lines for one date, or its error line.
pub fn daily_lines(report: &DailyReport) -> Vec<String> {
    match &report.outcome {
        Ok(records) => records.iter().map(record_line).collect(),
        Err(error) => vec![error_line(report, error)],
    }
}

/// Every date's header followed by its block, oldest first.
pub fn range_lines(range: &RangeReport) -> Vec<String> {
    range
        .days()
        .iter()
        .flat_map(|day| std::iter::once(header_line(day)).chain(daily_lines(day)))
        .collect()
}

/// Reply sent privately to a client whose command was rejected.
pub fn command_error_line(error: &CommandError) -> String {
    format!("Error: {error}.")
}
