//! UseCase: 切断時の後始末
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUserUseCase::execute() メソッド
//! - 全ルームからの退出、オンライン登録の解除、offline 通知
//!
//! ### なぜこのテストが必要か
//! - 切断は何度呼ばれても安全でなければならない（冪等）
//! - 同じ userId で再接続済みのユーザーを、古い接続の切断で消してはいけない
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数ルームに参加中のユーザーの切断
//! - エッジケース：user_connected 前の切断、二重切断、再接続後の古い接続の切断

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionRegistry, Identity, MessagePusher, OutboundEvent, PresenceStatus,
    RoomId, RoomRepository, Timestamp,
};

use super::{leave_room::announce_departure, sequencer::RoomEventSequencer};

/// 切断処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// 退出したルーム
    pub left_rooms: Vec<RoomId>,
    /// offline を通知したか
    pub went_offline: bool,
}

/// 切断処理のユースケース
pub struct DisconnectUserUseCase {
    rooms: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<RoomEventSequencer>,
}

impl DisconnectUserUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<RoomEventSequencer>,
    ) -> Self {
        Self {
            rooms,
            registry,
            message_pusher,
            clock,
            sequencer,
        }
    }

    /// 切断を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断された接続
    /// * `bound` - `user_connected` で束縛された Identity（未束縛なら None）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        bound: Option<&Identity>,
    ) -> DisconnectOutcome {
        // 1. この接続が持つメンバーシップを全ルームから削除
        let turn = self.sequencer.enter().await;
        let departures = self.rooms.leave_all(connection_id).await;
        let timestamp = Timestamp::new(self.clock.now_millis());
        let mut left_rooms = Vec::with_capacity(departures.len());
        for (room, departure) in &departures {
            announce_departure(self.message_pusher.as_ref(), room, departure, timestamp).await;
            left_rooms.push(room.id.clone());
        }
        drop(turn);

        // 2. 送信チャンネルを閉じる
        self.message_pusher.unregister_client(connection_id).await;

        // 3. オンライン登録の解除（この接続が登録中の場合のみ）
        let Some(identity) = bound else {
            tracing::info!("Anonymous connection '{}' disconnected", connection_id);
            return DisconnectOutcome {
                left_rooms,
                went_offline: false,
            };
        };

        let user_id = identity.member_user_id(connection_id);
        let went_offline = self.registry.unregister(&user_id, connection_id).await;
        if went_offline {
            let event = OutboundEvent::UserStatusChanged {
                user_id,
                username: identity.username().clone(),
                status: PresenceStatus::Offline,
            };
            if let Err(e) = self.message_pusher.broadcast_all(&event).await {
                tracing::warn!("Failed to broadcast offline status: {}", e);
            }
            tracing::info!(
                "User '{}' disconnected from '{}'",
                identity.username(),
                connection_id
            );
        } else {
            tracing::debug!(
                "'{}' is not the registered connection of '{}', keeping online status",
                connection_id,
                identity.username()
            );
        }

        DisconnectOutcome {
            left_rooms,
            went_offline,
        }
    }
}
