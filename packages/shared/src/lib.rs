//! Shared utilities for Cadence.
//!
//! Logger bootstrap and timestamp helpers used by both the server and the client.

pub mod logger;
pub mod time;
