//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `RatesError`, so functions can simply return `Result<T>`.
use crate::error::RatesError;

/// Workspace-wide `Result` alias with `RatesError` as the default error.
pub type Result<T, E = RatesError> = std::result::Result<T, E>;
