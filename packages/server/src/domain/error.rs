//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    #[error("UserId cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    #[error("Username cannot be empty")]
    UsernameEmpty,

    #[error("Username cannot exceed {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    /// RoomId の検証エラー
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    #[error("RoomId cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// MessageContent の検証エラー
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent が長すぎる
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,
}

/// Message Log（永続化）のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageLogError {
    /// ストレージの読み書きに失敗
    #[error("Message log storage failure: {0}")]
    Storage(String),

    /// レコードのエンコード・デコードに失敗
    #[error("Message log record is malformed: {0}")]
    Malformed(String),
}

/// 接続へのイベント送信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("Connection '{0}' is not registered")]
    ConnectionNotFound(String),

    #[error("Failed to push event: {0}")]
    PushFailed(String),

    #[error("Failed to encode event: {0}")]
    EncodeFailed(String),
}

/// 接続ごとのセッション状態機械のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 検証済み Identity も申告されたユーザー名もない
    #[error("No identity available for connection '{0}'")]
    MissingIdentity(String),

    /// 接続は既に閉じている
    #[error("Connection '{0}' is already disconnected")]
    Disconnected(String),
}
