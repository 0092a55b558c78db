//! Shared networking constants and helpers used by client and server.

/// TCP port for the text command channel (client <-> server).
pub const COMMAND_PORT: u16 = 8080;

/// Upstream exchange-rate endpoint. The date is appended as `&date=DD.MM.YYYY`.
pub const DEFAULT_API_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates?json";

/// Per-request upstream timeout, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Helper to format an IPv4 address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
