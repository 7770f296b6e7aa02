//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 永続化してからルームの全メンバー（送信者を含む）にブロードキャストする
//!
//! ### なぜこのテストが必要か
//! - 永続化に失敗したメッセージは誰にもブロードキャストしてはいけない
//! - 失敗は送信者だけに error イベントで知らせる
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人のルームでの送信（両者が同一の new_message を受け取る）
//! - 異常系：Message Log の書き込み失敗
//! - エッジケース：参加していないルームへの送信

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, Identity, MessageContent, MessageLog, MessagePusher, NewMessage,
    OutboundEvent, RoomId, RoomRepository, Timestamp,
};

use super::{error::SendMessageError, sequencer::RoomEventSequencer};

/// 送信者に返すエラーメッセージ
pub const SEND_FAILED_MESSAGE: &str = "Failed to send message.";

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_log: Arc<dyn MessageLog>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<RoomEventSequencer>,
}

impl SendMessageUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_log: Arc<dyn MessageLog>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<RoomEventSequencer>,
    ) -> Self {
        Self {
            rooms,
            message_log,
            message_pusher,
            clock,
            sequencer,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 永続化されブロードキャストされたメッセージ
    /// * `Err(SendMessageError)` - 永続化に失敗（送信者に error を通知済み）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        identity: &Identity,
        room_id: &RoomId,
        content: MessageContent,
    ) -> Result<ChatMessage, SendMessageError> {
        let new_message = NewMessage {
            room: room_id.clone(),
            sender: identity.username().clone(),
            content,
            requested_at: Timestamp::new(self.clock.now_millis()),
        };

        // 1. 永続化（失敗したら送信者にだけ通知）
        let message = match self.message_log.append(new_message).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    "Failed to persist message from '{}' in '{}': {}",
                    identity.username(),
                    room_id,
                    e
                );
                let error = OutboundEvent::Error {
                    message: SEND_FAILED_MESSAGE.to_string(),
                };
                if let Err(push_error) = self.message_pusher.push_to(connection_id, &error).await {
                    tracing::warn!("Failed to report send failure: {}", push_error);
                }
                return Err(e.into());
            }
        };

        // 2. ルームの現在のメンバーにブロードキャスト
        let _turn = self.sequencer.enter().await;
        let targets = self
            .rooms
            .get_room(room_id)
            .await
            .map(|room| room.member_connections())
            .unwrap_or_default();
        tracing::debug!(
            "Broadcasting message {} in '{}' to {} connections",
            message.id,
            room_id,
            targets.len()
        );
        let event = OutboundEvent::NewMessage(message.clone());
        if let Err(e) = self.message_pusher.broadcast(&targets, &event).await {
            tracing::warn!("Failed to broadcast new message: {}", e);
        }

        Ok(message)
    }
}
