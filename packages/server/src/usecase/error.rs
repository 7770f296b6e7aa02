//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::MessageLogError;

/// メッセージ送信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// 永続化に失敗した（ブロードキャストはしていない）
    #[error("Failed to persist message: {0}")]
    Persist(#[from] MessageLogError),
}

/// 履歴取得のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Failed to query history: {0}")]
    Log(#[from] MessageLogError),
}

/// ルーム一覧取得のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GetRoomsError {
    #[error("Failed to list rooms with history: {0}")]
    Log(#[from] MessageLogError),
}
