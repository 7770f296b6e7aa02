//! WebSocket chat relay server implementation.

pub mod connection;
mod handler;
mod server;
mod signal;
pub mod state; // UseCase の組み立てを bin・結合テストから行うため public

pub use server::{Server, router};
pub use state::{AppState, Dependencies};
