//! UseCase テスト用の共通フィクスチャ

use std::sync::Arc;

use irori_shared::time::{Clock, FixedClock};
use tokio::sync::mpsc;

use crate::{
    domain::{
        ChatMessage, ConnectionId, ConnectionRegistry, Identity, MessageContent, MessageLog,
        MessagePusher, NewMessage, RoomId, RoomRepository, Timestamp, UserId, Username,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryMessageLog, InMemoryRoomRepository},
    },
    usecase::sequencer::RoomEventSequencer,
};

pub const NOW: i64 = 1_700_000_000_000;

pub fn room(name: &str) -> RoomId {
    RoomId::new(name.to_string()).unwrap()
}

pub fn username(name: &str) -> Username {
    Username::new(name.to_string()).unwrap()
}

pub fn user_id(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn connection(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub fn declared(id: &str, name: &str) -> Identity {
    Identity::Declared {
        user_id: Some(user_id(id)),
        username: username(name),
    }
}

/// `count` 件のメッセージを 10ms 間隔で追記し、採番済みのメッセージを返す
pub async fn seed_messages(log: &dyn MessageLog, room_name: &str, count: usize) -> Vec<ChatMessage> {
    let mut stored = Vec::with_capacity(count);
    for i in 0..count {
        let message = log
            .append(NewMessage {
                room: room(room_name),
                sender: username("seed"),
                content: MessageContent::new(format!("message {}", i)).unwrap(),
                requested_at: Timestamp::new(NOW + i as i64 * 10),
            })
            .await
            .unwrap();
        stored.push(message);
    }
    stored
}

/// インメモリ実装一式
pub struct Fixture {
    pub rooms: Arc<dyn RoomRepository>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub message_log: Arc<dyn MessageLog>,
    pub pusher: Arc<dyn MessagePusher>,
    pub clock: Arc<dyn Clock>,
    pub sequencer: Arc<RoomEventSequencer>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_log(Arc::new(InMemoryMessageLog::new()))
    }

    pub fn with_log(message_log: Arc<dyn MessageLog>) -> Self {
        Self {
            rooms: Arc::new(InMemoryRoomRepository::default()),
            registry: Arc::new(InMemoryConnectionRegistry::default()),
            message_log,
            pusher: Arc::new(WebSocketMessagePusher::default()),
            clock: Arc::new(FixedClock::new(NOW)),
            sequencer: Arc::new(RoomEventSequencer::new()),
        }
    }

    /// 接続の送信チャンネルを登録し、受信側を返す
    pub async fn attach(&self, id: &str) -> Client {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(connection(id), tx).await;
        Client { rx }
    }
}

/// テスト側の受信口
pub struct Client {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Client {
    /// 現在までに届いたフレームを全て取り出す
    pub fn drain(&mut self) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    /// 届いたフレームの type を順に取り出す
    pub fn drain_types(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|f| f["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}
