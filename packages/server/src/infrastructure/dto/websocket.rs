//! WebSocket event DTOs.
//!
//! Every frame is a JSON object whose `type` field names the event; the rest of
//! the object is the payload with camelCase keys. Timestamps are Unix
//! milliseconds.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Events a client sends to the relay.
///
/// Payload fields are all optional: a frame with missing fields still parses
/// and is treated as a no-op by the handler that needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    UserConnected {
        user_id: Option<String>,
        username: Option<String>,
    },
    GetRooms,
    JoinRoom {
        room_id: Option<String>,
        user_id: Option<String>,
        username: Option<String>,
    },
    LeaveRoom {
        room_id: Option<String>,
        user_id: Option<String>,
        username: Option<String>,
    },
    SendMessage {
        room_id: Option<String>,
        content: Option<String>,
        username: Option<String>,
    },
    LoadMoreMessages {
        room_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_cursor")]
        before: Option<i64>,
    },
    Typing {
        room_id: Option<String>,
        username: Option<String>,
    },
    StopTyping {
        room_id: Option<String>,
        username: Option<String>,
    },
}

/// Read a `before` cursor leniently.
///
/// Accepts integer milliseconds, fractional milliseconds (rounded up), numeric
/// strings and RFC 3339 datetimes. Anything else reads as no cursor, so the
/// frame itself is never dropped.
fn lenient_cursor<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let cursor = value.as_ref().and_then(cursor_millis);
    if value.is_some_and(|v| !v.is_null()) && cursor.is_none() {
        tracing::debug!("Ignoring unparsable history cursor");
    }
    Ok(cursor)
}

fn cursor_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.ceil() as i64)
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|time| time.timestamp_millis())
            })
        }
        _ => None,
    }
}

/// Events the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    AvailableRooms {
        rooms: Vec<RoomInfo>,
    },
    RoomHistory {
        room_id: String,
        messages: Vec<MessageDto>,
    },
    UserJoined {
        username: String,
        room_id: String,
        timestamp: i64,
    },
    UserLeft {
        username: String,
        room_id: String,
        timestamp: i64,
    },
    RoomUsersUpdated {
        room_id: String,
        users: Vec<RoomUser>,
    },
    TypingUpdate {
        room_id: String,
        users: Vec<String>,
    },
    NewMessage(MessageDto),
    MoreMessages {
        room_id: String,
        messages: Vec<MessageDto>,
        has_more: bool,
    },
    UserStatusChanged {
        user_id: String,
        username: String,
        status: String,
    },
    Error {
        message: String,
    },
}

/// A persisted chat message as clients see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    /// Decimal message id
    pub id: String,
    pub sender: String,
    pub content: String,
    pub room: String,
    pub created_at: i64,
}

/// Entry of `available_rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub name: String,
    pub user_count: usize,
    pub has_history: bool,
}

/// Entry of `room_users_updated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUser {
    pub user_id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_parses_camel_case_payload() {
        // テスト項目: camelCase のペイロードが読み取れる
        // given (前提条件):
        let json = r#"{"type":"join_room","roomId":"general","userId":"u1","username":"alice"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_id: Some("general".to_string()),
                user_id: Some("u1".to_string()),
                username: Some("alice".to_string()),
            }
        );
    }

    #[test]
    fn test_client_event_missing_fields_become_none() {
        // テスト項目: 欠けたフィールドは None になり、パースは失敗しない
        // given (前提条件):
        let json = r#"{"type":"send_message","roomId":"general"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                room_id: Some("general".to_string()),
                content: None,
                username: None,
            }
        );
    }

    #[test]
    fn test_client_event_without_payload() {
        // テスト項目: ペイロードのないイベントが読み取れる
        // given (前提条件):
        let json = r#"{"type":"get_rooms"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEvent::GetRooms);
    }

    #[test]
    fn test_client_event_unknown_type_is_rejected() {
        // テスト項目: 未知のイベント名はパースエラー
        // given (前提条件):
        let json = r#"{"type":"delete_message","id":"1"}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    fn parse_cursor(before: Value) -> Option<i64> {
        let frame = serde_json::json!({
            "type": "load_more_messages",
            "roomId": "general",
            "before": before,
        });
        match serde_json::from_value::<ClientEvent>(frame).unwrap() {
            ClientEvent::LoadMoreMessages { before, .. } => before,
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_load_more_cursor_accepts_integer_and_numeric_string() {
        // テスト項目: 整数と数字の文字列はそのままミリ秒のカーソルになる
        // then (期待する結果):
        assert_eq!(parse_cursor(serde_json::json!(1_700_000_000_123_i64)), Some(1_700_000_000_123));
        assert_eq!(parse_cursor(serde_json::json!("1700000000123")), Some(1_700_000_000_123));
    }

    #[test]
    fn test_load_more_cursor_accepts_float_and_iso_string() {
        // テスト項目: 小数は切り上げ、RFC 3339 の日時はミリ秒に変換される
        // then (期待する結果):
        assert_eq!(parse_cursor(serde_json::json!(1000.25)), Some(1001));
        assert_eq!(parse_cursor(serde_json::json!(1000.0)), Some(1000));
        assert_eq!(
            parse_cursor(serde_json::json!("2023-11-14T22:13:20.123Z")),
            Some(1_700_000_000_123)
        );
    }

    #[test]
    fn test_load_more_unparsable_cursor_is_treated_as_absent() {
        // テスト項目: 解釈できないカーソルはフレームを捨てずにカーソルなしとして扱う
        // then (期待する結果):
        assert_eq!(parse_cursor(serde_json::json!("yesterday")), None);
        assert_eq!(parse_cursor(serde_json::json!({ "ts": 1 })), None);
        assert_eq!(parse_cursor(Value::Null), None);

        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"load_more_messages","roomId":"general"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::LoadMoreMessages {
                room_id: Some("general".to_string()),
                before: None,
            }
        );
    }

    #[test]
    fn test_new_message_is_flattened_into_frame() {
        // テスト項目: new_message はメッセージのフィールドがフレーム直下に並ぶ
        // given (前提条件):
        let event = ServerEvent::NewMessage(MessageDto {
            id: "7".to_string(),
            sender: "alice".to_string(),
            content: "hi".to_string(),
            room: "general".to_string(),
            created_at: 1000,
        });

        // when (操作):
        let value = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            serde_json::json!({
                "type": "new_message",
                "id": "7",
                "sender": "alice",
                "content": "hi",
                "room": "general",
                "createdAt": 1000
            })
        );
    }

    #[test]
    fn test_more_messages_uses_camel_case_keys() {
        // テスト項目: more_messages のキーが roomId / hasMore になる
        // given (前提条件):
        let event = ServerEvent::MoreMessages {
            room_id: "general".to_string(),
            messages: vec![],
            has_more: false,
        };

        // when (操作):
        let value = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            serde_json::json!({
                "type": "more_messages",
                "roomId": "general",
                "messages": [],
                "hasMore": false
            })
        );
    }
}
