//! Irori: a room-based real-time chat relay.
//!
//! Layers, innermost first:
//! - `domain`: identities, rooms, sessions, and the traits the outer layers implement
//! - `infrastructure`: in-memory and file stores, WebSocket delivery, wire DTOs
//! - `usecase`: one struct per coordinator operation
//! - `ui`: axum router, per-connection dispatch, server lifecycle

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
