//! ルーム・メンバー・メッセージのドメインモデル

use std::collections::{BTreeMap, BTreeSet};

use super::value_object::{ConnectionId, MessageContent, MessageId, RoomId, Timestamp, UserId, Username};

/// 接続が誰として振る舞うか
///
/// `Verified` はハンドシェイク時に検証したトークン由来。`Declared` はクライアントが
/// ペイロードで申告した値から作られ、真正性の保証はない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Verified { user_id: UserId, username: Username },
    Declared { user_id: Option<UserId>, username: Username },
}

impl Identity {
    pub fn username(&self) -> &Username {
        match self {
            Identity::Verified { username, .. } | Identity::Declared { username, .. } => username,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Identity::Verified { user_id, .. } => Some(user_id),
            Identity::Declared { user_id, .. } => user_id.as_ref(),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Identity::Verified { .. })
    }

    /// ログ用の短いラベル
    pub fn kind(&self) -> &'static str {
        match self {
            Identity::Verified { .. } => "verified",
            Identity::Declared { .. } => "declared",
        }
    }

    /// 退出時にメンバーエントリを探すキー
    pub fn member_key(&self) -> MemberKey {
        match self.user_id() {
            Some(user_id) => MemberKey::UserId(user_id.clone()),
            None => MemberKey::Username(self.username().clone()),
        }
    }

    /// メンバーとして登録するときの userId
    ///
    /// userId を持たない Identity は接続 ID をキーにする。
    pub fn member_user_id(&self, connection_id: &ConnectionId) -> UserId {
        self.user_id()
            .cloned()
            .unwrap_or_else(|| UserId::from(connection_id))
    }
}

/// メンバーエントリの検索キー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKey {
    UserId(UserId),
    /// 退出する Identity が userId を申告していない場合のみ
    Username(Username),
}

/// ルームのメンバー 1 人分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub username: Username,
    /// このメンバー宛てのルームイベントを受け取る接続
    pub connection_id: ConnectionId,
    pub joined_at: Timestamp,
}

impl Member {
    pub fn new(
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            username,
            connection_id,
            joined_at,
        }
    }
}

/// ルームから削除されたメンバーと、削除時にタイピング中だったか
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub member: Member,
    pub was_typing: bool,
}

/// 1 つのルームの在室・タイピング状態
///
/// メンバーは `UserId` をキーに持つので、何度再参加しても同じユーザーの
/// エントリが 2 つになることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    members: BTreeMap<UserId, Member>,
    typing: BTreeSet<Username>,
}

impl Room {
    /// 空のルームを作成
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: BTreeMap::new(),
            typing: BTreeSet::new(),
        }
    }

    /// メンバーを追加または更新する
    ///
    /// 新規メンバーなら `true`。再参加は既存のエントリを置き換え、
    /// 最新の接続がルームのイベントを受け取る。
    pub fn join(&mut self, member: Member) -> bool {
        let username = member.username.clone();
        match self.members.insert(member.user_id.clone(), member) {
            Some(previous) => {
                // 改名された旧ユーザー名は leave でも消せなくなる
                if previous.username != username {
                    self.typing.remove(&previous.username);
                }
                false
            }
            None => true,
        }
    }

    /// `key` に一致するメンバーを削除し、タイピング状態も消す
    pub fn leave(&mut self, key: &MemberKey) -> Option<Departure> {
        let user_id = match key {
            MemberKey::UserId(user_id) => user_id.clone(),
            MemberKey::Username(username) => self
                .members
                .values()
                .find(|m| &m.username == username)
                .map(|m| m.user_id.clone())?,
        };
        let member = self.members.remove(&user_id)?;
        let was_typing = self.typing.remove(&member.username);
        Some(Departure { member, was_typing })
    }

    /// `connection_id` に紐づくメンバーを全員削除
    pub fn leave_connection(&mut self, connection_id: &ConnectionId) -> Vec<Departure> {
        let user_ids: Vec<UserId> = self
            .members
            .values()
            .filter(|m| &m.connection_id == connection_id)
            .map(|m| m.user_id.clone())
            .collect();

        user_ids
            .into_iter()
            .filter_map(|user_id| self.leave(&MemberKey::UserId(user_id)))
            .collect()
    }

    /// タイピング中にする。既にタイピング中なら `false`
    pub fn start_typing(&mut self, username: Username) -> bool {
        self.typing.insert(username)
    }

    /// タイピング状態を消す。タイピング中でなければ `false`
    pub fn stop_typing(&mut self, username: &Username) -> bool {
        self.typing.remove(username)
    }

    /// 現在のメンバー（userId 順）
    pub fn members(&self) -> Vec<Member> {
        self.members.values().cloned().collect()
    }

    pub fn get_member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.get(user_id)
    }

    /// タイピング中のユーザー名（名前順）
    pub fn typing_users(&self) -> Vec<Username> {
        self.typing.iter().cloned().collect()
    }

    pub fn is_typing(&self, username: &Username) -> bool {
        self.typing.contains(username)
    }

    /// ルームのイベントの配信先
    pub fn member_connections(&self) -> Vec<ConnectionId> {
        let connections: BTreeSet<ConnectionId> = self
            .members
            .values()
            .map(|m| m.connection_id.clone())
            .collect();
        connections.into_iter().collect()
    }

    pub fn user_count(&self) -> usize {
        self.members.len()
    }
}

/// 永続化済みのメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Username,
    pub room: RoomId,
    pub content: MessageContent,
    /// サーバーが付与する作成時刻。並び順とページングのカーソルに使う
    pub created_at: Timestamp,
}

/// Message Log に追記する前のメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room: RoomId,
    pub sender: Username,
    pub content: MessageContent,
    /// 追記を要求した時刻。`created_at` を狭義単調増加に保つため、
    /// Message Log が先に進めることがある。
    pub requested_at: Timestamp,
}

/// ルーム一覧の 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub name: RoomId,
    pub user_count: usize,
    pub has_history: bool,
}

/// ルーム履歴の 1 ページ（`(created_at, id)` 昇順）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub room: RoomId,
    pub messages: Vec<ChatMessage>,
    /// ページが埋まっていれば `true`（さらに古いメッセージがあるかもしれない）
    pub has_more: bool,
}

impl HistoryPage {
    pub fn empty(room: RoomId) -> Self {
        Self {
            room,
            messages: Vec::new(),
            has_more: false,
        }
    }

    /// 1 つ前のページを取得するためのカーソル
    pub fn oldest_cursor(&self) -> Option<Timestamp> {
        self.messages.first().map(|m| m.created_at)
    }
}

/// オンライン・オフライン状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Online,
    Offline,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Offline => "offline",
        }
    }
}
