//! InMemory Connection Registry 実装

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionRegistry, UserId};

/// userId → 接続 ID のインメモリ対応表
pub struct InMemoryConnectionRegistry {
    online: Arc<Mutex<HashMap<UserId, ConnectionId>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new(online: Arc<Mutex<HashMap<UserId, ConnectionId>>>) -> Self {
        Self { online }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, user_id: UserId, connection_id: ConnectionId) -> Option<ConnectionId> {
        let mut online = self.online.lock().await;
        online.insert(user_id, connection_id)
    }

    async fn unregister(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        let mut online = self.online.lock().await;
        match online.get(user_id) {
            Some(current) if current == connection_id => {
                online.remove(user_id);
                true
            }
            _ => false,
        }
    }

    async fn connection_of(&self, user_id: &UserId) -> Option<ConnectionId> {
        let online = self.online.lock().await;
        online.get(user_id).cloned()
    }

    async fn count_online(&self) -> usize {
        let online = self.online.lock().await;
        online.len()
    }
}
