//! InMemory Message Log 実装
//!
//! `MessageIndex` はルームごとに `(created_at, id)` 昇順のベクタを持ち、
//! ファイル実装（`repository::file`）からも同じ索引として使われます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, MessageId, MessageLog, MessageLogError, NewMessage, RoomId, Timestamp,
};

/// ルーム別のメッセージ索引と採番状態
#[derive(Debug, Default)]
pub(crate) struct MessageIndex {
    rooms: HashMap<RoomId, Vec<ChatMessage>>,
    last_id: u64,
    last_created_at: Option<Timestamp>,
}

impl MessageIndex {
    /// 次の id と created_at を割り当てる（索引には追加しない）
    ///
    /// created_at はストア全体で狭義単調増加になるよう、直前の値以下なら 1ms 進める。
    pub(crate) fn stamp(&self, message: NewMessage) -> ChatMessage {
        let requested = message.requested_at.value();
        let created_at = match self.last_created_at {
            Some(last) if requested <= last.value() => last.value() + 1,
            _ => requested,
        };

        ChatMessage {
            id: MessageId::new(self.last_id + 1),
            sender: message.sender,
            room: message.room,
            content: message.content,
            created_at: Timestamp::new(created_at),
        }
    }

    /// 採番済みのメッセージを索引に追加する
    pub(crate) fn insert(&mut self, message: ChatMessage) {
        self.last_id = self.last_id.max(message.id.value());
        self.last_created_at = Some(match self.last_created_at {
            Some(last) => last.max(message.created_at),
            None => message.created_at,
        });

        let messages = self.rooms.entry(message.room.clone()).or_default();
        let key = (message.created_at, message.id);
        let position = messages.partition_point(|m| (m.created_at, m.id) < key);
        messages.insert(position, message);
    }

    /// `before` 未満で `before` に最も近い最大 `limit` 件を昇順で返す
    pub(crate) fn query(
        &self,
        room: &RoomId,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Vec<ChatMessage> {
        let Some(messages) = self.rooms.get(room) else {
            return Vec::new();
        };

        let end = match before {
            Some(cursor) => messages.partition_point(|m| m.created_at < cursor),
            None => messages.len(),
        };
        let start = end.saturating_sub(limit);
        messages[start..end].to_vec()
    }

    /// メッセージが存在するルーム名（名前順）
    pub(crate) fn rooms(&self) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self.rooms.keys().cloned().collect();
        rooms.sort();
        rooms
    }

    pub(crate) fn len(&self) -> usize {
        self.rooms.values().map(Vec::len).sum()
    }
}

/// インメモリ Message Log 実装（プロセス終了で消える）
#[derive(Default)]
pub struct InMemoryMessageLog {
    index: Mutex<MessageIndex>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, MessageLogError> {
        let mut index = self.index.lock().await;
        let stored = index.stamp(message);
        index.insert(stored.clone());
        tracing::debug!(
            "Appended message {} to room '{}' ({} messages total)",
            stored.id,
            stored.room,
            index.len()
        );
        Ok(stored)
    }

    async fn query_range(
        &self,
        room: &RoomId,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, MessageLogError> {
        let index = self.index.lock().await;
        Ok(index.query(room, before, limit))
    }

    async fn distinct_rooms(&self) -> Result<Vec<RoomId>, MessageLogError> {
        let index = self.index.lock().await;
        Ok(index.rooms())
    }
}
