//! Error types shared between client and server.
//!
//! `RatesError` unifies the I/O, text decoding, HTTP, and channel failures that can
//! end a connection or a process. Per-date fetch outcomes are not errors at this level:
//! they travel inside a `DailyReport` as a [`FetchError`] so that one bad date never
//! aborts a whole range. Bad user input is a [`CommandError`].
use std::io;
use std::string::FromUtf8Error;

use strum_macros::Display;
use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum RatesError {
    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// UTF-8 conversion error when handling text content.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Failure while building or using the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),
}

/// Coarse classification of a per-date fetch failure, used in logs.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FetchErrorKind {
    NoData,
    UpstreamError,
    TransportError,
}

/// Why a single date could not produce any rate records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The upstream answered successfully but with an empty rate list.
    #[error("no exchange rate data")]
    NoData,

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}")]
    Upstream {
        /// HTTP status code as received.
        status: u16,
    },

    /// Connection, timeout, or response decoding failure.
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    /// Classify this failure.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::NoData => FetchErrorKind::NoData,
            FetchError::Upstream { .. } => FetchErrorKind::UpstreamError,
            FetchError::Transport(_) => FetchErrorKind::TransportError,
        }
    }
}

/// Rejected user input for a range request. Reported to the requester only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Day count below one.
    #[error("number of days must be greater than 0")]
    InvalidArgument(i64),

    /// Day count above the configured limit.
    #[error("number of days must not exceed {max}")]
    TooManyDays {
        /// Requested day count.
        requested: i64,
        /// Largest accepted day count.
        max: i64,
    },

    /// Day count is not an integer.
    #[error("number of days must be an integer (e.g. 'ecd 5')")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_kinds() {
        assert_eq!(FetchError::NoData.kind(), FetchErrorKind::NoData);
        assert_eq!(
            FetchError::Upstream { status: 503 }.kind(),
            FetchErrorKind::UpstreamError
        );
        assert_eq!(
            FetchError::Transport("refused".into()).kind().to_string(),
            "TransportError"
        );
    }

    #[test]
    fn rates_error_from_io() {
        let err: RatesError = std::io::Error::other("broken pipe").into();
        assert_eq!(err.to_string(), "I/O error: broken pipe");
    }

    #[test]
    fn command_error_messages() {
        assert_eq!(
            CommandError::InvalidArgument(0).to_string(),
            "number of days must be greater than 0"
        );
        let err = CommandError::TooManyDays { requested: 40, max: 30 };
        assert!(err.to_string().ends_with("30"));
    }
}
