//! Exchange-rate data model.
//!
//! A `RateRecord` is one currency row as the upstream reported it; rates are kept as
//! the strings received, no numeric parsing. A `DailyReport` is the outcome of one
//! upstream lookup for one calendar date, and a `RangeReport` is the date-ordered
//! collection built for an N-day request.
use chrono::NaiveDate;

use crate::error::FetchError;

/// Date format used by the upstream API and in every user-facing line.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Format `date` as `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Exchange rate of a single currency on a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRecord {
    /// Currency code, e.g. `EUR`.
    pub currency: String,
    /// Rate at which the bank buys the currency.
    pub buy: String,
    /// Rate at which the bank sells the currency.
    pub sell: String,
}

impl RateRecord {
    /// Build a record from anything string-like.
    pub fn new(currency: impl Into<String>, buy: impl Into<String>, sell: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            buy: buy.into(),
            sell: sell.into(),
        }
    }
}

/// Outcome of one upstream lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    /// Date the lookup was made for.
    pub date: NaiveDate,
    /// Rate rows in upstream order, or why there are none.
    pub outcome: Result<Vec<RateRecord>, FetchError>,
}

impl DailyReport {
    /// Successful lookup.
    pub fn records(date: NaiveDate, records: Vec<RateRecord>) -> Self {
        Self {
            date,
            outcome: Ok(records),
        }
    }

    /// Failed lookup.
    pub fn failed(date: NaiveDate, error: FetchError) -> Self {
        Self {
            date,
            outcome: Err(error),
        }
    }

    /// `true` when the lookup produced records.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The failure for this date, if any.
    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().err()
    }
}

/// Daily reports ordered by ascending date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeReport {
    days: Vec<DailyReport>,
}

impl RangeReport {
    /// Wrap reports that are already in chronological order.
    pub(crate) fn from_ordered(days: Vec<DailyReport>) -> Self {
        Self { days }
    }

    /// Reports, oldest first.
    pub fn days(&self) -> &[DailyReport] {
        &self.days
    }

    /// Number of dates covered.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// `true` when the range covers no dates.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl IntoIterator for RangeReport {
    type Item = DailyReport;
    type IntoIter = std::vec::IntoIter<DailyReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dates_day_first() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_date(date), "07.03.2024");
    }

    #[test]
    fn daily_report_accessors() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let ok = DailyReport::records(date, vec![RateRecord::new("EUR", "39.0", "39.5")]);
        assert!(ok.is_ok());
        assert!(ok.error().is_none());

        let failed = DailyReport::failed(date, FetchError::NoData);
        assert!(!failed.is_ok());
        assert_eq!(failed.error(), Some(&FetchError::NoData));
    }
}
