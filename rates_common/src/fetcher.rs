//! Upstream exchange-rate lookups.
//!
//! `RateFetcher` performs exactly one blocking HTTP GET per date and turns the answer
//! into a `DailyReport`. Failures are never retried; they are recorded in the report.
//! The `RateSource` trait is the seam used by `RangeAggregator`, so aggregation can be
//! driven by any source that maps a date to a report.
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::rate::{DailyReport, RateRecord, format_date};
use crate::result::Result;

/// Placeholder for a field the upstream left out.
const MISSING: &str = "n/a";

/// Anything that can produce the report for one date.
pub trait RateSource: Send + Sync {
    /// Look up the rates for `date`. Must not panic on upstream failure.
    fn fetch(&self, date: NaiveDate) -> DailyReport;
}

#[derive(Debug, Deserialize)]
struct ExchangeRatesBody {
    #[serde(rename = "exchangeRate", default)]
    exchange_rate: Vec<RateEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateEntry {
    currency: Option<Value>,
    purchase_rate: Option<Value>,
    #[serde(rename = "purchaseRateNB")]
    purchase_rate_nb: Option<Value>,
    sale_rate: Option<Value>,
    #[serde(rename = "saleRateNB")]
    sale_rate_nb: Option<Value>,
}

impl RateEntry {
    fn into_record(self) -> RateRecord {
        RateRecord {
            currency: text(self.currency),
            buy: text(self.purchase_rate.or(self.purchase_rate_nb)),
            sell: text(self.sale_rate.or(self.sale_rate_nb)),
        }
    }
}

/// Render a JSON scalar as-is: strings without quotes, numbers in canonical form.
fn text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::from(MISSING),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

/// Interpret one upstream answer for `date`.
///
/// - success with a non-empty `exchangeRate` list: records in upstream order
/// - success with an empty or absent list: `NoData`
/// - any other status: `Upstream`
/// - a body that does not decode: `Transport`
pub fn interpret_response(date: NaiveDate, status: u16, body: &str) -> DailyReport {
    if !(200..300).contains(&status) {
        return DailyReport::failed(date, FetchError::Upstream { status });
    }
    match decode_body(body) {
        Ok(parsed) if parsed.exchange_rate.is_empty() => {
            DailyReport::failed(date, FetchError::NoData)
        }
        Ok(parsed) => DailyReport::records(
            date,
            parsed
                .exchange_rate
                .into_iter()
                .map(RateEntry::into_record)
                .collect(),
        ),
        Err(e) => DailyReport::failed(
            date,
            FetchError::Transport(format!("malformed response: {e}")),
        ),
    }
}

/// Decode a body that must be a JSON object. Top-level arrays are rejected.
fn decode_body(body: &str) -> serde_json::Result<ExchangeRatesBody> {
    match serde_json::from_str::<Value>(body)? {
        value @ Value::Object(_) => ExchangeRatesBody::deserialize(value),
        _ => Err(serde::de::Error::custom("expected a JSON object")),
    }
}

/// Describe a transport failure with its whole cause chain.
fn describe(err: &reqwest::Error) -> String {
    use std::error::Error as _;

    let mut text = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// HTTP-backed `RateSource` for the PrivatBank exchange-rate archive.
#[derive(Debug, Clone)]
pub struct RateFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RateFetcher {
    /// Create a fetcher for `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rates/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a fetcher around a preconfigured `reqwest` client.
    pub fn with_client(client: reqwest::blocking::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Request URL for `date`.
    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}&date={}", self.base_url, format_date(date))
    }
}

impl RateSource for RateFetcher {
    fn fetch(&self, date: NaiveDate) -> DailyReport {
        let url = self.url_for(date);
        debug!("GET {}", url);

        let report = match self.client.get(&url).send() {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text() {
                    Ok(body) => interpret_response(date, status, &body),
                    Err(e) => DailyReport::failed(date, FetchError::Transport(describe(&e))),
                }
            }
            Err(e) => DailyReport::failed(date, FetchError::Transport(describe(&e))),
        };

        if let Some(err) = report.error() {
            warn!("Fetch for {} failed ({}): {}", format_date(date), err.kind(), err);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn local_fetcher(base_url: String) -> RateFetcher {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        RateFetcher::with_client(client, base_url)
    }

    #[test]
    fn reads_records_verbatim() {
        let body = r#"{
            "date": "15.01.2024",
            "exchangeRate": [
                {"baseCurrency": "UAH", "currency": "EUR", "saleRate": 39.5, "purchaseRate": 39.0,
                 "saleRateNB": 41.2, "purchaseRateNB": 41.2},
                {"baseCurrency": "UAH", "currency": "CHF", "saleRateNB": 43.89, "purchaseRateNB": 43.89}
            ]
        }"#;
        let report = interpret_response(day(), 200, body);
        assert_eq!(
            report.outcome,
            Ok(vec![
                RateRecord::new("EUR", "39.0", "39.5"),
                RateRecord::new("CHF", "43.89", "43.89"),
            ])
        );
    }

    #[test]
    fn missing_fields_are_marked() {
        let report = interpret_response(day(), 200, r#"{"exchangeRate":[{"currency":"PLN"}]}"#);
        assert_eq!(report.outcome, Ok(vec![RateRecord::new("PLN", "n/a", "n/a")]));
    }

    #[test]
    fn empty_list_is_no_data() {
        let report = interpret_response(day(), 200, r#"{"exchangeRate":[]}"#);
        assert_eq!(report.error(), Some(&FetchError::NoData));
        let report = interpret_response(day(), 200, r#"{"date":"15.01.2024"}"#);
        assert_eq!(report.error(), Some(&FetchError::NoData));
    }

    #[test]
    fn non_success_is_upstream_error() {
        let report = interpret_response(day(), 500, "oops");
        assert_eq!(report.error(), Some(&FetchError::Upstream { status: 500 }));
    }

    #[test]
    fn garbage_is_transport_error() {
        let report = interpret_response(day(), 200, "<html>");
        assert!(matches!(report.error(), Some(FetchError::Transport(_))));
        for body in ["[1, 2]", "[]", "[[]]", r#"[[{"currency":"EUR"}]]"#, "42", "null"] {
            let report = interpret_response(day(), 200, body);
            assert!(
                matches!(report.error(), Some(FetchError::Transport(_))),
                "{body}: {:?}",
                report.outcome
            );
        }
    }

    #[test]
    fn builds_date_keyed_url() {
        let fetcher = RateFetcher::new("http://host/api?json", Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.url_for(day()), "http://host/api?json&date=15.01.2024");
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let fetcher = local_fetcher(format!("http://{addr}/api?json"));
        let report = fetcher.fetch(day());
        assert_eq!(report.date, day());
        assert!(matches!(report.error(), Some(FetchError::Transport(_))));
    }

    #[test]
    fn silent_upstream_times_out_as_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (release, hold) = crossbeam_channel::bounded::<()>(0);
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let _ = hold.recv();
            drop(stream);
        });

        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        let fetcher = RateFetcher::with_client(client, format!("http://{addr}/api?json"));
        let report = fetcher.fetch(day());
        drop(release);
        server.join().unwrap();

        assert_eq!(report.date, day());
        match report.error() {
            Some(FetchError::Transport(description)) => {
                assert!(description.contains("timed out"), "{description}")
            }
            other => panic!("expected a transport error, got {other:?}"),
        }
    }

    #[test]
    fn fetches_over_http() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut header = String::new();
            while reader.read_line(&mut header).unwrap() > 0 && header != "\r\n" {
                header.clear();
            }
            let body = r#"{"exchangeRate":[{"currency":"USD","purchaseRate":37.5,"saleRate":38.1}]}"#;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
            request_line
        });

        let fetcher = local_fetcher(format!("http://{addr}/p24api/exchange_rates?json"));
        let report = fetcher.fetch(day());
        let request_line = server.join().unwrap();

        assert!(request_line.contains("date=15.01.2024"), "{request_line}");
        assert_eq!(report.outcome, Ok(vec![RateRecord::new("USD", "37.5", "38.1")]));
    }
}
