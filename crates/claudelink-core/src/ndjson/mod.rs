//! NDJSON parser for the Claude Code stream-json protocol.
//!
//! Each line of the CLI's stdout is one self-describing JSON event. This
//! module decodes the shapes the bridge consumes (assistant tool use and the
//! terminal result), implementing a tolerant reader pattern: unknown fields
//! are ignored and unknown event types are retained with their session id.

mod parser;
mod types;

pub use parser::{parse_line, parse_value};
pub use types::*;
