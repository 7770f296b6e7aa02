//! 接続ごとのライフサイクル
//!
//! ```text
//! Connecting ──user_connected──▶ NoRoom ◀──leave_room── InRoom
//!     │                            │  ──join_room──▶      │
//!     └────────────── disconnect ──┴──────────────────────┴──▶ Disconnected
//! ```
//!
//! セッションが束縛する Identity は高々 1 つ。`user_connected` より前に届いた
//! イベントは、検証済みトークンの Identity、次にペイロードで申告された
//! フィールドの順にフォールバックする。

use std::collections::BTreeSet;

use super::{
    entity::Identity,
    error::SessionError,
    value_object::{ConnectionId, RoomId, UserId, Username},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 接続済み、Identity は未束縛
    Connecting,
    /// Identity 束縛済み、どのルームにもいない
    NoRoom,
    /// 1 つ以上のルームに参加中
    InRoom,
    Disconnected,
}

#[derive(Debug)]
pub struct Session {
    connection_id: ConnectionId,
    verified: Option<Identity>,
    bound: Option<Identity>,
    rooms: BTreeSet<RoomId>,
    disconnected: bool,
}

impl Session {
    /// 新しい接続のセッションを作成
    ///
    /// `verified` はハンドシェイク時のトークンから得た Identity（あれば）。
    pub fn new(connection_id: ConnectionId, verified: Option<Identity>) -> Self {
        Self {
            connection_id,
            verified,
            bound: None,
            rooms: BTreeSet::new(),
            disconnected: false,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn state(&self) -> SessionState {
        if self.disconnected {
            SessionState::Disconnected
        } else if !self.rooms.is_empty() {
            SessionState::InRoom
        } else if self.bound.is_some() {
            SessionState::NoRoom
        } else {
            SessionState::Connecting
        }
    }

    pub fn bound_identity(&self) -> Option<&Identity> {
        self.bound.as_ref()
    }

    /// 接続の Identity を束縛する（`user_connected`）
    ///
    /// 最初に成功した束縛が有効で、以降の呼び出しは束縛済みの Identity を返し
    /// 新しい申告は無視する。検証済みトークンの Identity は常に申告より優先。
    /// userId を申告しない場合は接続 ID を
    /// userId として使う。
    pub fn bind(
        &mut self,
        declared_user_id: Option<UserId>,
        declared_username: Option<Username>,
    ) -> Result<Identity, SessionError> {
        self.ensure_open()?;
        if let Some(identity) = &self.bound {
            return Ok(identity.clone());
        }

        let identity = match &self.verified {
            Some(verified) => verified.clone(),
            None => Identity::Declared {
                user_id: Some(
                    declared_user_id.unwrap_or_else(|| UserId::from(&self.connection_id)),
                ),
                username: declared_username.ok_or_else(|| {
                    SessionError::MissingIdentity(self.connection_id.to_string())
                })?,
            },
        };
        self.bound = Some(identity.clone());
        Ok(identity)
    }

    /// 1 つのイベントを処理するときの Identity
    pub fn resolve(
        &self,
        declared_user_id: Option<UserId>,
        declared_username: Option<Username>,
    ) -> Result<Identity, SessionError> {
        self.ensure_open()?;
        if let Some(identity) = self.bound.as_ref().or(self.verified.as_ref()) {
            return Ok(identity.clone());
        }
        match declared_username {
            Some(username) => Ok(Identity::Declared {
                user_id: declared_user_id,
                username,
            }),
            None => Err(SessionError::MissingIdentity(
                self.connection_id.to_string(),
            )),
        }
    }

    /// `room` への参加を記録する。再参加なら `false`
    pub fn enter_room(&mut self, room: RoomId) -> Result<bool, SessionError> {
        self.ensure_open()?;
        Ok(self.rooms.insert(room))
    }

    /// `room` からの退出を記録する。参加していなければ `false`
    pub fn exit_room(&mut self, room: &RoomId) -> bool {
        self.rooms.remove(room)
    }

    pub fn joined_rooms(&self) -> Vec<RoomId> {
        self.rooms.iter().cloned().collect()
    }

    /// セッションを閉じる。束縛済みの Identity を返すのは最初の呼び出しだけなので、
    /// 後始末は 1 回しか走らない。
    pub fn disconnect(&mut self) -> Option<Identity> {
        if self.disconnected {
            return None;
        }
        self.disconnected = true;
        self.rooms.clear();
        self.bound.take()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.disconnected {
            return Err(SessionError::Disconnected(self.connection_id.to_string()));
        }
        Ok(())
    }
}
