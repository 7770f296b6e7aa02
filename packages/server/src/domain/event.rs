//! 接続へ送るイベント
//!
//! ワイヤーフォーマットへの変換は `infrastructure::dto::websocket` が担い、
//! この enum は何が起きたかだけを表します。

use super::{
    entity::{ChatMessage, HistoryPage, Member, PresenceStatus, RoomSummary},
    value_object::{RoomId, Timestamp, UserId, Username},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// `get_rooms` への応答
    AvailableRooms { rooms: Vec<RoomSummary> },
    /// 参加直後の接続に送る最初のページ
    RoomHistory {
        room: RoomId,
        messages: Vec<ChatMessage>,
    },
    UserJoined {
        username: Username,
        room: RoomId,
        timestamp: Timestamp,
    },
    UserLeft {
        username: Username,
        room: RoomId,
        timestamp: Timestamp,
    },
    RoomUsersUpdated { room: RoomId, users: Vec<Member> },
    TypingUpdate { room: RoomId, users: Vec<Username> },
    NewMessage(ChatMessage),
    /// `load_more_messages` への応答
    MoreMessages(HistoryPage),
    UserStatusChanged {
        user_id: UserId,
        username: Username,
        status: PresenceStatus,
    },
    Error { message: String },
}

impl OutboundEvent {
    /// ワイヤー上のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::AvailableRooms { .. } => "available_rooms",
            OutboundEvent::RoomHistory { .. } => "room_history",
            OutboundEvent::UserJoined { .. } => "user_joined",
            OutboundEvent::UserLeft { .. } => "user_left",
            OutboundEvent::RoomUsersUpdated { .. } => "room_users_updated",
            OutboundEvent::TypingUpdate { .. } => "typing_update",
            OutboundEvent::NewMessage(_) => "new_message",
            OutboundEvent::MoreMessages(_) => "more_messages",
            OutboundEvent::UserStatusChanged { .. } => "user_status_changed",
            OutboundEvent::Error { .. } => "error",
        }
    }
}
