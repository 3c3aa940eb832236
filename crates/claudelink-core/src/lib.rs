//! claudelink core library
//!
//! Shared functionality for the claudelink bridge:
//! - NDJSON parsing for the Claude Code stream-json protocol
//! - Human-readable tool-invocation descriptions for status messages
//! - Common error types and tracing setup

pub mod describe;
pub mod error;
pub mod ndjson;
pub mod tracing_init;

pub use error::{Error, Result};
