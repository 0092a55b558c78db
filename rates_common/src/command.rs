//! Text commands sent by clients to the server.
//!
//! The grammar is plain text and case-sensitive:
//! - `exchange`: rates for the current day.
//! - `ecd <n>`: rates for the last `n` days, today included.
//!
//! Anything else is not a command and is ignored by the server.
use std::str::FromStr;

use strum_macros::EnumString;

use crate::error::CommandError;

/// Command keyword, the first word of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum Keyword {
    /// Current-day rates.
    #[strum(serialize = "exchange")]
    Exchange,
    /// Exchange Currency Data: an N-day range.
    #[strum(serialize = "ecd")]
    Ecd,
}

/// Parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch today's rates.
    Exchange,
    /// Fetch a range of `days` ending today. The count is not yet validated.
    Range {
        /// Requested day count, as sent.
        days: i64,
    },
}

impl Command {
    /// Parse one inbound message.
    ///
    /// Returns `Ok(None)` for messages outside the grammar, and `Err` only for an `ecd`
    /// whose argument is not an integer.
    pub fn parse(message: &str) -> Result<Option<Command>, CommandError> {
        match message.split_once(' ') {
            None => match Keyword::from_str(message) {
                Ok(Keyword::Exchange) => Ok(Some(Command::Exchange)),
                _ => Ok(None),
            },
            Some((word, arg)) => match Keyword::from_str(word) {
                Ok(Keyword::Ecd) => arg
                    .trim()
                    .parse::<i64>()
                    .map(|days| Some(Command::Range { days }))
                    .map_err(|e| CommandError::Parse(format!("{arg:?}: {e}"))),
                _ => Ok(None),
            },
        }
    }
}

/// Check a range request's day count against `1..=max_days`.
pub fn validate_days(days: i64, max_days: i64) -> Result<usize, CommandError> {
    if days < 1 {
        return Err(CommandError::InvalidArgument(days));
    }
    if days > max_days {
        return Err(CommandError::TooManyDays {
            requested: days,
            max: max_days,
        });
    }
    usize::try_from(days).map_err(|e| CommandError::Parse(e.to_string()))
}
