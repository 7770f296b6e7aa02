//! 値オブジェクト
//!
//! ドメインの値を表す不変のオブジェクト。同一性ではなく値で比較されます。
//! 生成時に検証を行い、不正な値は `ValueObjectError` で拒否します。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// 識別子（userId・ユーザー名・ルーム名）の最大長（バイト）
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// メッセージ本文の最大長（バイト）
pub const MAX_MESSAGE_CONTENT_LEN: usize = 10000;

/// ユーザーの安定した識別子
///
/// ルームのメンバーはユーザー名ではなくこの値をキーにする。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// UserId を作成
    ///
    /// # Errors
    ///
    /// 空、または [`MAX_IDENTIFIER_LEN`] を超える場合はエラー
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::UserIdEmpty);
        }
        let len = id.len();
        if len > MAX_IDENTIFIER_LEN {
            return Err(ValueObjectError::UserIdTooLong {
                max: MAX_IDENTIFIER_LEN,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    /// 内部の文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// String に変換
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<&ConnectionId> for UserId {
    /// userId を申告しない匿名セッションは接続 ID をキーにする。
    fn from(connection_id: &ConnectionId) -> Self {
        Self(connection_id.as_str().to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 表示用のユーザー名
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Username を作成
    ///
    /// # Errors
    ///
    /// 空、または [`MAX_IDENTIFIER_LEN`] を超える場合はエラー
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::UsernameEmpty);
        }
        let len = name.len();
        if len > MAX_IDENTIFIER_LEN {
            return Err(ValueObjectError::UsernameTooLong {
                max: MAX_IDENTIFIER_LEN,
                actual: len,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ルーム名
///
/// ルームはクライアントが名前で指定する。[`MAX_IDENTIFIER_LEN`] バイト以内の
/// 空でない名前はそのままルームを指し、作成の手順はない。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// RoomId を作成
    ///
    /// # Errors
    ///
    /// 空、または長すぎる場合はエラー
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        let len = id.len();
        if len > MAX_IDENTIFIER_LEN {
            return Err(ValueObjectError::RoomIdTooLong {
                max: MAX_IDENTIFIER_LEN,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メッセージ本文
///
/// 空でなく、[`MAX_MESSAGE_CONTENT_LEN`] バイト以内であること。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent(String);

impl MessageContent {
    /// MessageContent を作成
    ///
    /// # Arguments
    ///
    /// * `content` - メッセージ本文
    ///
    /// # Returns
    ///
    /// 検証に通れば MessageContent、失敗すればエラー
    pub fn new(content: String) -> Result<Self, ValueObjectError> {
        if content.is_empty() {
            return Err(ValueObjectError::MessageContentEmpty);
        }
        let len = content.len();
        if len > MAX_MESSAGE_CONTENT_LEN {
            return Err(ValueObjectError::MessageContentTooLong {
                max: MAX_MESSAGE_CONTENT_LEN,
                actual: len,
            });
        }
        Ok(Self(content))
    }

    /// 内部の文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// String に変換
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message Log が採番するメッセージ ID
///
/// 追記順に増加するので、`created_at` が同じ場合の並び順を決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1 本の WebSocket 接続の識別子
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// ConnectionId を作成
    ///
    /// # Errors
    ///
    /// 空の場合はエラー
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(id))
    }

    /// UUID から ConnectionId を作成
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// タイムスタンプ
///
/// Unix 時間（ミリ秒）を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Timestamp を作成
    ///
    /// # Arguments
    ///
    /// * `value` - Unix 時間（ミリ秒）
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// 内部の i64 を取得
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
