//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    ChatMessage, HistoryPage, Member, MessageContent, MessageId, OutboundEvent, RoomId,
    RoomSummary, Timestamp, Username, ValueObjectError,
};
use crate::infrastructure::dto::{
    http::RoomSummaryDto,
    storage::StoredMessage,
    websocket::{MessageDto, RoomInfo, RoomUser, ServerEvent},
};

// ========================================
// DTO → Domain Entity
// ========================================

/// Convert an optional payload field into a value object.
///
/// Missing and invalid values both become `None`.
pub fn optional_field<T>(value: Option<String>) -> Option<T>
where
    T: TryFrom<String, Error = ValueObjectError>,
{
    match value.map(T::try_from) {
        Some(Ok(value)) => Some(value),
        Some(Err(e)) => {
            tracing::debug!("Ignoring invalid payload field: {}", e);
            None
        }
        None => None,
    }
}

impl TryFrom<StoredMessage> for ChatMessage {
    type Error = ValueObjectError;

    fn try_from(record: StoredMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(record.id),
            sender: Username::new(record.sender)?,
            room: RoomId::new(record.room)?,
            content: MessageContent::new(record.content)?,
            created_at: Timestamp::new(record.created_at),
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for StoredMessage {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.id.value(),
            sender: model.sender.as_str().to_string(),
            room: model.room.as_str().to_string(),
            content: model.content.as_str().to_string(),
            created_at: model.created_at.value(),
        }
    }
}

impl From<&ChatMessage> for MessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.id.to_string(),
            sender: model.sender.as_str().to_string(),
            content: model.content.as_str().to_string(),
            room: model.room.as_str().to_string(),
            created_at: model.created_at.value(),
        }
    }
}

impl From<&RoomSummary> for RoomInfo {
    fn from(model: &RoomSummary) -> Self {
        Self {
            name: model.name.as_str().to_string(),
            user_count: model.user_count,
            has_history: model.has_history,
        }
    }
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            name: model.name.into_string(),
            user_count: model.user_count,
            has_history: model.has_history,
        }
    }
}

impl From<&Member> for RoomUser {
    fn from(model: &Member) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
        }
    }
}

fn messages_to_dto(messages: &[ChatMessage]) -> Vec<MessageDto> {
    messages.iter().map(MessageDto::from).collect()
}

impl From<&HistoryPage> for ServerEvent {
    fn from(page: &HistoryPage) -> Self {
        ServerEvent::MoreMessages {
            room_id: page.room.as_str().to_string(),
            messages: messages_to_dto(&page.messages),
            has_more: page.has_more,
        }
    }
}

impl From<&OutboundEvent> for ServerEvent {
    fn from(event: &OutboundEvent) -> Self {
        match event {
            OutboundEvent::AvailableRooms { rooms } => ServerEvent::AvailableRooms {
                rooms: rooms.iter().map(RoomInfo::from).collect(),
            },
            OutboundEvent::RoomHistory { room, messages } => ServerEvent::RoomHistory {
                room_id: room.as_str().to_string(),
                messages: messages_to_dto(messages),
            },
            OutboundEvent::UserJoined {
                username,
                room,
                timestamp,
            } => ServerEvent::UserJoined {
                username: username.as_str().to_string(),
                room_id: room.as_str().to_string(),
                timestamp: timestamp.value(),
            },
            OutboundEvent::UserLeft {
                username,
                room,
                timestamp,
            } => ServerEvent::UserLeft {
                username: username.as_str().to_string(),
                room_id: room.as_str().to_string(),
                timestamp: timestamp.value(),
            },
            OutboundEvent::RoomUsersUpdated { room, users } => ServerEvent::RoomUsersUpdated {
                room_id: room.as_str().to_string(),
                users: users.iter().map(RoomUser::from).collect(),
            },
            OutboundEvent::TypingUpdate { room, users } => ServerEvent::TypingUpdate {
                room_id: room.as_str().to_string(),
                users: users.iter().map(|u| u.as_str().to_string()).collect(),
            },
            OutboundEvent::NewMessage(message) => ServerEvent::NewMessage(message.into()),
            OutboundEvent::MoreMessages(page) => page.into(),
            OutboundEvent::UserStatusChanged {
                user_id,
                username,
                status,
            } => ServerEvent::UserStatusChanged {
                user_id: user_id.as_str().to_string(),
                username: username.as_str().to_string(),
                status: status.as_str().to_string(),
            },
            OutboundEvent::Error { message } => ServerEvent::Error {
                message: message.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, PresenceStatus, UserId};

    fn chat_message() -> ChatMessage {
        ChatMessage {
            id: MessageId::new(42),
            sender: Username::new("alice".to_string()).unwrap(),
            room: RoomId::new("general".to_string()).unwrap(),
            content: MessageContent::new("hi".to_string()).unwrap(),
            created_at: Timestamp::new(1000),
        }
    }

    #[test]
    fn test_optional_field_drops_invalid_values() {
        // テスト項目: 空文字列などの不正な値は None として扱われる
        // given (前提条件):
        let valid = Some("general".to_string());
        let empty = Some(String::new());

        // when (操作):
        let valid: Option<RoomId> = optional_field(valid);
        let empty: Option<RoomId> = optional_field(empty);
        let missing: Option<RoomId> = optional_field(None);

        // then (期待する結果):
        assert_eq!(valid, Some(RoomId::new("general".to_string()).unwrap()));
        assert_eq!(empty, None);
        assert_eq!(missing, None);
    }

    #[test]
    fn test_domain_chat_message_to_dto() {
        // テスト項目: ドメインの ChatMessage が DTO に変換され、id は 10 進文字列になる
        // given (前提条件):
        let message = chat_message();

        // when (操作):
        let dto = MessageDto::from(&message);

        // then (期待する結果):
        assert_eq!(dto.id, "42");
        assert_eq!(dto.sender, "alice");
        assert_eq!(dto.room, "general");
        assert_eq!(dto.content, "hi");
        assert_eq!(dto.created_at, 1000);
    }

    #[test]
    fn test_stored_message_to_domain() {
        // テスト項目: 保存レコードがドメインの ChatMessage に戻る
        // given (前提条件):
        let record = StoredMessage::from(&chat_message());

        // when (操作):
        let message = ChatMessage::try_from(record).unwrap();

        // then (期待する結果):
        assert_eq!(message, chat_message());
    }

    #[test]
    fn test_stored_message_with_empty_sender_is_rejected() {
        // テスト項目: 不正な保存レコードは変換エラー
        // given (前提条件):
        let record = StoredMessage {
            id: 1,
            sender: String::new(),
            room: "general".to_string(),
            content: "hi".to_string(),
            created_at: 1,
        };

        // when (操作):
        let result = ChatMessage::try_from(record);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::UsernameEmpty));
    }

    #[test]
    fn test_room_users_updated_to_dto() {
        // テスト項目: 参加者一覧が userId / username の組に変換される
        // given (前提条件):
        let member = Member::new(
            UserId::new("u1".to_string()).unwrap(),
            Username::new("alice".to_string()).unwrap(),
            ConnectionId::new("c1".to_string()).unwrap(),
            Timestamp::new(1),
        );
        let event = OutboundEvent::RoomUsersUpdated {
            room: RoomId::new("general".to_string()).unwrap(),
            users: vec![member],
        };

        // when (操作):
        let dto = ServerEvent::from(&event);

        // then (期待する結果):
        assert_eq!(
            dto,
            ServerEvent::RoomUsersUpdated {
                room_id: "general".to_string(),
                users: vec![RoomUser {
                    user_id: "u1".to_string(),
                    username: "alice".to_string(),
                }],
            }
        );
    }

    #[test]
    fn test_user_status_changed_to_dto() {
        // テスト項目: プレゼンスの状態が文字列に変換される
        // given (前提条件):
        let event = OutboundEvent::UserStatusChanged {
            user_id: UserId::new("u1".to_string()).unwrap(),
            username: Username::new("alice".to_string()).unwrap(),
            status: PresenceStatus::Offline,
        };

        // when (操作):
        let dto = ServerEvent::from(&event);

        // then (期待する結果):
        assert_eq!(
            dto,
            ServerEvent::UserStatusChanged {
                user_id: "u1".to_string(),
                username: "alice".to_string(),
                status: "offline".to_string(),
            }
        );
    }
}
