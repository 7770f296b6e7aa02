//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! 全ルームを 1 つの Mutex で保護し、各メソッドを 1 つのクリティカルセクションとして
//! 実行します。参加者・タイピングの変更はロック中に同期的に行い、途中で await しません。

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Departure, Member, MemberKey, Room, RoomId, RoomRepository, Username,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// ルーム名 → ルーム
    rooms: Arc<Mutex<BTreeMap<RoomId, Room>>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(rooms: Arc<Mutex<BTreeMap<RoomId, Room>>>) -> Self {
        Self { rooms }
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(BTreeMap::new())))
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(&self, room_id: &RoomId, member: Member) -> Room {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone()));
        if !room.join(member) {
            tracing::debug!("Re-join to room '{}' refreshed an existing entry", room_id);
        }
        room.clone()
    }

    async fn leave(&self, room_id: &RoomId, key: &MemberKey) -> Option<(Room, Departure)> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id)?;
        let departure = room.leave(key)?;
        Some((room.clone(), departure))
    }

    async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<(Room, Departure)> {
        let mut rooms = self.rooms.lock().await;
        let mut departures = Vec::new();
        for room in rooms.values_mut() {
            let left = room.leave_connection(connection_id);
            if left.is_empty() {
                continue;
            }
            let snapshot = room.clone();
            departures.extend(left.into_iter().map(|d| (snapshot.clone(), d)));
        }
        departures
    }

    async fn start_typing(&self, room_id: &RoomId, username: &Username) -> Option<Room> {
        let mut rooms = self.rooms.lock().await;
        // 誰も参加したことのないルームは作らない（通知先もいない）
        let Some(room) = rooms.get_mut(room_id) else {
            tracing::debug!("Ignoring typing in unknown room '{}'", room_id);
            return None;
        };
        room.start_typing(username.clone()).then(|| room.clone())
    }

    async fn stop_typing(&self, room_id: &RoomId, username: &Username) -> Room {
        let mut rooms = self.rooms.lock().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.stop_typing(username);
                room.clone()
            }
            None => Room::new(room_id.clone()),
        }
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }

    async fn occupancy(&self) -> Vec<(RoomId, usize)> {
        let rooms = self.rooms.lock().await;
        rooms
            .values()
            .map(|room| (room.id.clone(), room.user_count()))
            .collect()
    }
}
