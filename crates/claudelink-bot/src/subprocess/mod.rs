//! Claude CLI subprocess lifecycle: spawn, stream, terminate.
//!
//! One child process per chat message. Its NDJSON stdout is read line by
//! line on a dedicated thread and handed to the async side over an mpsc
//! channel, preserving arrival order.

mod launcher;

pub use launcher::{LaunchError, SpawnConfig, TurnProcess, spawn_turn};
