//! Shared utilities for the Irori workspace.
//!
//! - `logger`: tracing subscriber setup for binaries
//! - `time`: clock abstraction used to stamp events and messages

pub mod logger;
pub mod time;
