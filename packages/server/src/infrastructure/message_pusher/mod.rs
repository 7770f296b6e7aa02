//! MessagePusher の実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
