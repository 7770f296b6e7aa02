//! UseCase: ルームからの退出
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - 退出時の通知順序（user_left → room_users_updated → typing_update）
//!
//! ### なぜこのテストが必要か
//! - タイピング中のまま退出したユーザーが typing_update に残ってはいけない
//! - 参加していないルームからの退出は何も起こさない（プロトコル誤用は no-op）
//!
//! ### どのような状況を想定しているか
//! - 正常系：userId による退出
//! - エッジケース：userId のない宣言 Identity（username で探す）、未参加のルーム

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::domain::{
    Departure, Identity, MessagePusher, OutboundEvent, Room, RoomId, RoomRepository, Timestamp,
};

use super::sequencer::RoomEventSequencer;

/// 退出したメンバーをルームの残りのメンバーに知らせる
///
/// 切断時の後始末（DisconnectUserUseCase）からも使われる。
/// 呼び出し側は退出処理と同じ RoomEventSequencer のガードを保持していること。
pub(crate) async fn announce_departure(
    message_pusher: &dyn MessagePusher,
    room: &Room,
    departure: &Departure,
    timestamp: Timestamp,
) {
    let targets = room.member_connections();
    let mut events = vec![
        OutboundEvent::UserLeft {
            username: departure.member.username.clone(),
            room: room.id.clone(),
            timestamp,
        },
        OutboundEvent::RoomUsersUpdated {
            room: room.id.clone(),
            users: room.members(),
        },
    ];
    if departure.was_typing {
        events.push(OutboundEvent::TypingUpdate {
            room: room.id.clone(),
            users: room.typing_users(),
        });
    }

    for event in &events {
        if let Err(e) = message_pusher.broadcast(&targets, event).await {
            tracing::warn!("Failed to broadcast '{}': {}", event.name(), e);
        }
    }
}

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<RoomEventSequencer>,
}

impl LeaveRoomUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<RoomEventSequencer>,
    ) -> Self {
        Self {
            rooms,
            message_pusher,
            clock,
            sequencer,
        }
    }

    /// ルーム退出を実行
    ///
    /// # Returns
    ///
    /// 削除されたメンバー。該当者がいなければ None（何も通知しない）
    pub async fn execute(&self, room_id: &RoomId, identity: &Identity) -> Option<Departure> {
        let _turn = self.sequencer.enter().await;
        let Some((room, departure)) = self.rooms.leave(room_id, &identity.member_key()).await
        else {
            tracing::debug!(
                "'{}' is not a member of '{}', ignoring leave",
                identity.username(),
                room_id
            );
            return None;
        };

        tracing::info!(
            "User '{}' left room '{}' ({} remaining)",
            departure.member.username,
            room_id,
            room.user_count()
        );

        let timestamp = Timestamp::new(self.clock.now_millis());
        announce_departure(self.message_pusher.as_ref(), &room, &departure, timestamp).await;

        Some(departure)
    }
}
