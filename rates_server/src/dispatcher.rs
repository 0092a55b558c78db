//! Command handling for one inbound message.
//!
//! `BroadcastServer` turns a client message into report lines and decides who sees
//! them: rate answers are broadcast to every registered connection, while rejected
//! day counts are answered to the sender alone. Unknown messages are ignored.
use crate::model::registry::{Connection, ConnectionRegistry};
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use rates_common::command::validate_days;
use rates_common::fetcher::RateSource;
use rates_common::format::{command_error_line, daily_lines, range_lines};
use rates_common::{Command, CommandError, RangeAggregator};
use std::sync::Arc;

/// What handling a message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Lines were broadcast; holds how many connections received them all.
    Broadcast {
        /// Number of lines sent.
        lines: usize,
        /// Connections that got every line.
        recipients: usize,
    },
    /// A validation error was sent to the requester only.
    Replied,
    /// Not a command.
    Ignored,
}

/// Source of "today" for `exchange` and the last day of every `ecd` range.
pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Shared state behind every session: the registry and the rate pipeline.
pub struct BroadcastServer {
    registry: Arc<ConnectionRegistry>,
    aggregator: RangeAggregator<dyn RateSource>,
    max_days: i64,
    clock: Clock,
}

impl BroadcastServer {
    /// Create a server answering from `source`, accepting at most `max_days` per range.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        source: Box<dyn RateSource>,
        max_days: i64,
    ) -> Self {
        Self {
            registry,
            aggregator: RangeAggregator::new(source),
            max_days,
            clock: local_today,
        }
    }

    /// Replace the local-time clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handle one message received from `sender`.
    pub fn handle(&self, sender: &Connection, message: &str) -> Outcome {
        match Command::parse(message) {
            Ok(Some(Command::Exchange)) => {
                info!("{} requested today's rates", sender.label());
                let lines = daily_lines(&self.aggregator.day((self.clock)()));
                self.broadcast(&lines)
            }
            Ok(Some(Command::Range { days })) => {
                info!("{} requested {} day(s) of rates", sender.label(), days);
                match validate_days(days, self.max_days)
                    .and_then(|_| self.aggregator.aggregate_until((self.clock)(), days))
                {
                    Ok(range) => self.broadcast(&range_lines(&range)),
                    Err(e) => self.reply(sender, &e),
                }
            }
            Ok(None) => {
                debug!("Ignoring message from {}: {:?}", sender.label(), message);
                Outcome::Ignored
            }
            Err(e) => self.reply(sender, &e),
        }
    }

    fn broadcast(&self, lines: &[String]) -> Outcome {
        let recipients = self.registry.broadcast(lines);
        Outcome::Broadcast {
            lines: lines.len(),
            recipients,
        }
    }

    fn reply(&self, sender: &Connection, error: &CommandError) -> Outcome {
        debug!("Rejecting request from {}: {}", sender.label(), error);
        if let Err(e) = sender.send(command_error_line(error)) {
            warn!("Reply to {} failed: {}", sender.label(), e);
        }
        Outcome::Replied
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Days;
    use crossbeam_channel::{Receiver, unbounded};
    use rates_common::rate::format_date;
    use rates_common::{DailyReport, FetchError, RateRecord};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source answering from a per-date table; unknown dates have no data.
    #[derive(Default)]
    pub(crate) struct TableSource {
        pub(crate) table: Mutex<HashMap<NaiveDate, Result<Vec<RateRecord>, FetchError>>>,
        pub(crate) calls: Arc<AtomicUsize>,
    }

    impl RateSource for TableSource {
        fn fetch(&self, date: NaiveDate) -> DailyReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .table
                .lock()
                .unwrap()
                .get(&date)
                .cloned()
                .unwrap_or(Err(FetchError::NoData));
            DailyReport { date, outcome }
        }
    }

    pub(crate) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn server(source: TableSource) -> BroadcastServer {
        BroadcastServer::new(Arc::new(ConnectionRegistry::new()), Box::new(source), 30)
            .with_clock(today)
    }

    fn join(server: &BroadcastServer, label: &str) -> (Connection, Receiver<String>) {
        let (tx, rx) = unbounded();
        let conn = server.registry().connection(label, None, tx);
        server.registry().register(conn.clone());
        (conn, rx)
    }

    fn drain(rx: &Receiver<String>) -> Vec<String> {
        rx.try_iter().collect()
    }

    #[test]
    fn two_day_range_is_broadcast_to_everyone_in_date_order() {
        let d2 = today();
        let d1 = d2.checked_sub_days(Days::new(1)).unwrap();
        let source = TableSource::default();
        source
            .table
            .lock()
            .unwrap()
            .insert(d1, Ok(vec![RateRecord::new("EUR", "39.0", "39.5")]));
        let server = server(source);
        let (a, rx_a) = join(&server, "A");
        let (_b, rx_b) = join(&server, "B");
        let (_c, rx_c) = join(&server, "C");

        let outcome = server.handle(&a, "ecd 2");
        assert_eq!(outcome, Outcome::Broadcast { lines: 4, recipients: 3 });

        let expected = vec![
            format!("Exchange rates for {}: ***===================***", format_date(d1)),
            String::from("EUR: buy: 39.0, sale: 39.5"),
            format!("Exchange rates for {}: ***===================***", format_date(d2)),
            format!("No exchange rate data found for {}.", format_date(d2)),
        ];
        assert_eq!(drain(&rx_a), expected);
        assert_eq!(drain(&rx_b), expected);
        assert_eq!(drain(&rx_c), expected);
    }

    #[test]
    fn clock_decides_which_dates_are_fetched() {
        let source = TableSource::default();
        source
            .table
            .lock()
            .unwrap()
            .insert(today(), Ok(vec![RateRecord::new("EUR", "39.0", "39.5")]));
        let server = server(source);
        let (a, rx_a) = join(&server, "A");

        server.handle(&a, "ecd 1");
        assert_eq!(
            drain(&rx_a),
            vec![
                "Exchange rates for 02.05.2024: ***===================***",
                "EUR: buy: 39.0, sale: 39.5",
            ]
        );
    }

    #[test]
    fn exchange_broadcasts_today_without_header() {
        let source = TableSource::default();
        source.table.lock().unwrap().insert(
            today(),
            Ok(vec![
                RateRecord::new("USD", "37.5", "38.1"),
                RateRecord::new("EUR", "40.0", "40.9"),
            ]),
        );
        let server = server(source);
        let (a, rx_a) = join(&server, "A");
        let (_b, rx_b) = join(&server, "B");

        server.handle(&a, "exchange");
        let expected = vec!["USD: buy: 37.5, sale: 38.1", "EUR: buy: 40.0, sale: 40.9"];
        assert_eq!(drain(&rx_a), expected);
        assert_eq!(drain(&rx_b), expected);
    }

    #[test]
    fn bad_day_counts_are_answered_privately() {
        let source = TableSource::default();
        let calls = Arc::clone(&source.calls);
        let server = server(source);
        let (a, rx_a) = join(&server, "A");
        let (_b, rx_b) = join(&server, "B");

        assert_eq!(server.handle(&a, "ecd abc"), Outcome::Replied);
        assert_eq!(server.handle(&a, "ecd 0"), Outcome::Replied);
        assert_eq!(server.handle(&a, "ecd -3"), Outcome::Replied);
        assert_eq!(server.handle(&a, "ecd 31"), Outcome::Replied);

        assert_eq!(
            drain(&rx_a),
            vec![
                "Error: number of days must be an integer (e.g. 'ecd 5').",
                "Error: number of days must be greater than 0.",
                "Error: number of days must be greater than 0.",
                "Error: number of days must not exceed 30.",
            ]
        );
        assert!(drain(&rx_b).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_messages_are_ignored() {
        let source = TableSource::default();
        let calls = Arc::clone(&source.calls);
        let server = server(source);
        let (a, rx_a) = join(&server, "A");

        for message in ["hello", "Exchange", "ecd", ""] {
            assert_eq!(server.handle(&a, message), Outcome::Ignored);
        }
        assert!(drain(&rx_a).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sender_need_not_be_registered_for_a_reply() {
        let server = server(TableSource::default());
        let (tx, rx) = unbounded();
        let outsider = server.registry().connection("outsider", None, tx);
        server.handle(&outsider, "ecd x");
        assert_eq!(drain(&rx).len(), 1);
    }
}
