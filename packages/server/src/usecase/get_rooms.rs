//! UseCase: ルーム一覧の取得
//!
//! メンバーのいるルームと、履歴のあるルームの和集合を名前順で返す。

use std::{collections::BTreeMap, sync::Arc};

use crate::domain::{
    ConnectionId, MessageLog, MessagePusher, OutboundEvent, RoomRepository, RoomSummary,
};

use super::error::GetRoomsError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_log: Arc<dyn MessageLog>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetRoomsUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_log: Arc<dyn MessageLog>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            rooms,
            message_log,
            message_pusher,
        }
    }

    /// ルーム一覧を取得
    pub async fn execute(&self) -> Result<Vec<RoomSummary>, GetRoomsError> {
        let with_history = self.message_log.distinct_rooms().await?;

        let mut summaries: BTreeMap<_, RoomSummary> = BTreeMap::new();
        for (name, user_count) in self.rooms.occupancy().await {
            summaries.insert(
                name.clone(),
                RoomSummary {
                    name,
                    user_count,
                    has_history: false,
                },
            );
        }
        for name in with_history {
            summaries
                .entry(name.clone())
                .or_insert_with(|| RoomSummary {
                    name,
                    user_count: 0,
                    has_history: false,
                })
                .has_history = true;
        }

        Ok(summaries.into_values().collect())
    }

    /// `get_rooms` に応答する（失敗時は空の一覧）
    pub async fn reply_to(&self, connection_id: &ConnectionId) -> Vec<RoomSummary> {
        let rooms = self.execute().await.unwrap_or_else(|e| {
            tracing::error!("Failed to list rooms: {}", e);
            Vec::new()
        });
        let event = OutboundEvent::AvailableRooms {
            rooms: rooms.clone(),
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!("Failed to send room list to '{}': {}", connection_id, e);
        }
        rooms
    }
}
