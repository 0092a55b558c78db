//! Server-side connection bookkeeping.
//!
//! - `registry`: the live connection set and broadcast fan-out.
//! - `label`: random human-readable names for connections, used in logs.

pub mod label;
pub mod registry;
