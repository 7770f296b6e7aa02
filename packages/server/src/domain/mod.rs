//! ドメイン層
//!
//! ルーム・メンバー・メッセージのモデルと、ユースケースが依存する trait を定義します。
//! DTO やインフラの詳細には依存しません。

pub mod auth;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod message_pusher;
pub mod repository;
pub mod session;
pub mod value_object;

pub use auth::TokenVerifier;
pub use entity::{
    ChatMessage, Departure, HistoryPage, Identity, Member, MemberKey, NewMessage,
    PresenceStatus, Room, RoomSummary,
};
pub use error::{MessageLogError, MessagePushError, SessionError, ValueObjectError};
pub use event::OutboundEvent;
pub use factory::ConnectionIdFactory;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{ConnectionRegistry, MessageLog, RoomRepository};
pub use session::{Session, SessionState};
pub use value_object::{
    ConnectionId, MessageContent, MessageId, RoomId, Timestamp, UserId, Username,
};

#[cfg(test)]
pub use repository::MockMessageLog;
