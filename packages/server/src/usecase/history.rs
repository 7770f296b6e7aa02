//! UseCase: 履歴のページング
//!
//! ## ページングの規約
//!
//! - 初回（join 時）: カーソルなし、最新 `initial_limit` 件を昇順
//! - 遡り（load_more_messages）: カーソル（クライアントが持つ最古の createdAt）より前で、
//!   カーソルに最も近い `scrollback_limit` 件を昇順
//! - `has_more` はページが満杯のときだけ true。ちょうど境界で履歴が尽きた場合は
//!   true になり得るが（次のページが空になるだけ）、続きがあるのに false になることはない

use std::sync::Arc;

use crate::domain::{HistoryPage, MessageLog, RoomId, Timestamp};

use super::error::HistoryError;

/// 初回ロードの件数
pub const DEFAULT_INITIAL_LIMIT: usize = 100;
/// 遡り 1 回あたりの件数
pub const DEFAULT_SCROLLBACK_LIMIT: usize = 50;

/// Message Log を履歴ページに変換する
pub struct HistoryPaginator {
    message_log: Arc<dyn MessageLog>,
    initial_limit: usize,
    scrollback_limit: usize,
}

impl HistoryPaginator {
    pub fn new(
        message_log: Arc<dyn MessageLog>,
        initial_limit: usize,
        scrollback_limit: usize,
    ) -> Self {
        Self {
            message_log,
            initial_limit,
            scrollback_limit,
        }
    }

    pub fn with_default_limits(message_log: Arc<dyn MessageLog>) -> Self {
        Self::new(message_log, DEFAULT_INITIAL_LIMIT, DEFAULT_SCROLLBACK_LIMIT)
    }

    /// join 直後に送る最新ページ
    pub async fn initial_page(&self, room: &RoomId) -> Result<HistoryPage, HistoryError> {
        self.page(room, None, self.initial_limit).await
    }

    /// `before` より前のページ。`before` が None なら最新から
    pub async fn page_before(
        &self,
        room: &RoomId,
        before: Option<Timestamp>,
    ) -> Result<HistoryPage, HistoryError> {
        self.page(room, before, self.scrollback_limit).await
    }

    async fn page(
        &self,
        room: &RoomId,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<HistoryPage, HistoryError> {
        let messages = self.message_log.query_range(room, before, limit).await?;
        let has_more = limit > 0 && messages.len() == limit;
        Ok(HistoryPage {
            room: room.clone(),
            messages,
            has_more,
        })
    }
}
