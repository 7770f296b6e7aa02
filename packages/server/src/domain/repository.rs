//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 排他制御
//!
//! `RoomRepository` と `ConnectionRegistry` の各メソッドは 1 つのクリティカル
//! セクションとして実行されます（メソッドの途中で他のイベントが割り込まない）。
//! 他のイベント処理と交差し得るのは `MessageLog` へのアクセスだけです。

use async_trait::async_trait;

use super::{
    ChatMessage, ConnectionId, Departure, Member, MemberKey, MessageLogError, NewMessage, Room,
    RoomId, Timestamp, UserId, Username,
};

/// Room Repository trait（メンバー・タイピング集合の保持）
///
/// ルームの参加者集合とタイピング集合を所有するストア。
/// ルームは最初に参照された時点で作成され、削除されない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 参加者を追加（同じ userId の既存エントリは置き換え）し、追加後のルームを返す
    async fn join(&self, room: &RoomId, member: Member) -> Room;

    /// 参加者を削除し、タイピング状態も消す。該当者がいなければ None
    async fn leave(&self, room: &RoomId, key: &MemberKey) -> Option<(Room, Departure)>;

    /// 接続に紐づく参加者を全ルームから削除する（切断時の後始末）
    async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<(Room, Departure)>;

    /// タイピング開始。既にタイピング中なら None（ブロードキャスト不要）
    async fn start_typing(&self, room: &RoomId, username: &Username) -> Option<Room>;

    /// タイピング終了。変化の有無にかかわらず現在のルームを返す
    async fn stop_typing(&self, room: &RoomId, username: &Username) -> Room;

    /// ルームを取得（未参照のルームは None）
    async fn get_room(&self, room: &RoomId) -> Option<Room>;

    /// 既知の全ルームの (名前, 参加者数)
    async fn occupancy(&self) -> Vec<(RoomId, usize)>;
}

/// Connection Registry trait（userId → 接続）
///
/// userId と現在の接続の対応表。同じ userId の再登録は後勝ち。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続を登録し、置き換えられた以前の接続を返す
    async fn register(&self, user_id: UserId, connection_id: ConnectionId) -> Option<ConnectionId>;

    /// 登録を解除する。登録中の接続が `connection_id` と一致する場合のみ削除し、削除したら true
    async fn unregister(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool;

    /// userId の現在の接続
    async fn connection_of(&self, user_id: &UserId) -> Option<ConnectionId>;

    /// オンライン中のユーザー数
    async fn count_online(&self) -> usize;
}

/// Message Log trait（追記専用のメッセージ履歴）
///
/// 追記専用のメッセージストア。`created_at` はストア全体で狭義単調増加になるよう
/// 採番され、`id` は挿入順に増加する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// メッセージを永続化し、採番済みのメッセージを返す
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, MessageLogError>;

    /// `before` より前（排他的）のメッセージのうち、`before` に最も近い最大 `limit` 件を
    /// `(created_at, id)` 昇順で返す。`before` が None なら最新の `limit` 件
    async fn query_range(
        &self,
        room: &RoomId,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, MessageLogError>;

    /// 一度でもメッセージが追記されたルーム名
    async fn distinct_rooms(&self) -> Result<Vec<RoomId>, MessageLogError>;
}
