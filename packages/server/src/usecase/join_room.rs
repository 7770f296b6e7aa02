//! UseCase: ルームへの参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 通知の順序（user_joined → room_users_updated → 参加者本人への room_history）
//!
//! ### なぜこのテストが必要か
//! - room_users_updated は join 直後の参加者集合と完全に一致しなければならない
//! - 同じ userId の二重 join でメンバーが重複してはいけない
//! - 履歴の取得に失敗しても join 自体は成功し、空の履歴が届く
//!
//! ### どのような状況を想定しているか
//! - 正常系：空のルームへの参加、既存メンバーのいるルームへの参加
//! - 異常系：Message Log の障害
//! - エッジケース：二重 join

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::domain::{
    ConnectionId, HistoryPage, Identity, Member, MessagePusher, OutboundEvent, Room, RoomId,
    RoomRepository, Timestamp,
};

use super::{history::HistoryPaginator, sequencer::RoomEventSequencer};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    history: Arc<HistoryPaginator>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<RoomEventSequencer>,
}

impl JoinRoomUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        history: Arc<HistoryPaginator>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<RoomEventSequencer>,
    ) -> Self {
        Self {
            rooms,
            history,
            message_pusher,
            clock,
            sequencer,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// 参加直後のルームのスナップショット
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        identity: &Identity,
        room_id: &RoomId,
    ) -> Room {
        let timestamp = Timestamp::new(self.clock.now_millis());
        let member = Member::new(
            identity.member_user_id(connection_id),
            identity.username().clone(),
            connection_id.clone(),
            timestamp,
        );

        // 1〜2 は他のルームイベントと直列化する
        let turn = self.sequencer.enter().await;

        // 1. メンバーに追加（userId をキーに置き換え）
        let room = self.rooms.join(room_id, member).await;
        tracing::info!(
            "User '{}' joined room '{}' ({} members)",
            identity.username(),
            room_id,
            room.user_count()
        );

        // 2. ルームの全員に通知
        let targets = room.member_connections();
        let events = [
            OutboundEvent::UserJoined {
                username: identity.username().clone(),
                room: room_id.clone(),
                timestamp,
            },
            OutboundEvent::RoomUsersUpdated {
                room: room_id.clone(),
                users: room.members(),
            },
        ];
        for event in &events {
            if let Err(e) = self.message_pusher.broadcast(&targets, event).await {
                tracing::warn!("Failed to broadcast '{}': {}", event.name(), e);
            }
        }
        drop(turn);

        // 3. 参加者本人に履歴を送る（失敗時は空）
        let page = match self.history.initial_page(room_id).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to load history of '{}': {}", room_id, e);
                HistoryPage::empty(room_id.clone())
            }
        };
        tracing::debug!(
            "Sending {} history messages of '{}' to '{}'",
            page.messages.len(),
            room_id,
            connection_id
        );
        let history = OutboundEvent::RoomHistory {
            room: page.room,
            messages: page.messages,
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &history).await {
            tracing::warn!("Failed to send room history to '{}': {}", connection_id, e);
        }

        room
    }
}
