//! Data Transfer Objects (DTOs) for the chat relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event frames (inbound and outbound)
//! - `http`: HTTP API response DTOs
//! - `storage`: JSON-lines records of the file message log

pub mod conversion;
pub mod http;
pub mod storage;
pub mod websocket;
