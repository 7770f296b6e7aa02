//! UseCase: 接続とユーザーのオンライン登録
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::attach() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 同じ userId の再接続は後勝ちで、エラーにはならない
//! - オンライン通知はルームに関係なく全接続に届く必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ユーザーのオンライン登録
//! - エッジケース：同じ userId での再接続（別の接続で二重登録）

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRegistry, Identity, MessagePusher, OutboundEvent, PresenceStatus,
    PusherChannel,
};

/// 接続・オンライン登録のユースケース
pub struct ConnectUserUseCase {
    /// ConnectionRegistry（userId → 接続）
    registry: Arc<dyn ConnectionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectUserUseCase {
    /// 新しい ConnectUserUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// トランスポートのハンドシェイク直後に、接続の送信チャンネルを登録する
    pub async fn attach(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.message_pusher
            .register_client(connection_id, sender)
            .await;
    }

    /// `user_connected` を処理する
    ///
    /// # Returns
    ///
    /// 置き換えられた以前の接続（再接続の場合）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        identity: &Identity,
    ) -> Option<ConnectionId> {
        let user_id = identity.member_user_id(connection_id);
        let replaced = self
            .registry
            .register(user_id.clone(), connection_id.clone())
            .await;

        match &replaced {
            Some(previous) if previous != connection_id => tracing::info!(
                "User '{}' reconnected on '{}' (was '{}')",
                identity.username(),
                connection_id,
                previous
            ),
            _ => tracing::info!(
                "User '{}' ({}, {}) is online on '{}'",
                identity.username(),
                user_id,
                identity.kind(),
                connection_id
            ),
        }

        let event = OutboundEvent::UserStatusChanged {
            user_id,
            username: identity.username().clone(),
            status: PresenceStatus::Online,
        };
        if let Err(e) = self.message_pusher.broadcast_all(&event).await {
            tracing::warn!("Failed to broadcast online status: {}", e);
        }

        replaced
    }
}
