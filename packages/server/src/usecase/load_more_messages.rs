//! UseCase: 履歴の遡り読み込み
//!
//! 失敗時は空のページ（has_more: false）を返し、クライアントの遡りを止める。

use std::sync::Arc;

use crate::domain::{ConnectionId, HistoryPage, MessagePusher, OutboundEvent, RoomId, Timestamp};

use super::history::HistoryPaginator;

/// 履歴遡りのユースケース
pub struct LoadMoreMessagesUseCase {
    history: Arc<HistoryPaginator>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl LoadMoreMessagesUseCase {
    pub fn new(history: Arc<HistoryPaginator>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            history,
            message_pusher,
        }
    }

    /// `before` より前のページを要求元の接続に送る
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        before: Option<Timestamp>,
    ) -> HistoryPage {
        let page = match self.history.page_before(room_id, before).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to load more messages of '{}': {}", room_id, e);
                HistoryPage::empty(room_id.clone())
            }
        };
        tracing::debug!(
            "Sending {} older messages of '{}' to '{}' (has_more: {})",
            page.messages.len(),
            room_id,
            connection_id,
            page.has_more
        );

        let event = OutboundEvent::MoreMessages(page.clone());
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!("Failed to send more messages to '{}': {}", connection_id, e);
        }
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageLogError, MockMessageLog},
        usecase::test_support::{Fixture, connection, room, seed_messages},
    };

    fn create_usecase(fixture: &Fixture) -> LoadMoreMessagesUseCase {
        LoadMoreMessagesUseCase::new(
            Arc::new(HistoryPaginator::with_default_limits(
                fixture.message_log.clone(),
            )),
            fixture.pusher.clone(),
        )
    }

    #[tokio::test]
    async fn test_load_more_returns_closest_page_before_cursor() {
        // テスト項目: カーソル直前の 50 件が昇順で届き、has_more が true
        // given (前提条件):
        let fixture = Fixture::new();
        let stored = seed_messages(fixture.message_log.as_ref(), "general", 130).await;
        let usecase = create_usecase(&fixture);
        let mut alice = fixture.attach("c1").await;
        let cursor = stored[100].created_at;

        // when (操作):
        let page = usecase
            .execute(&connection("c1"), &room("general"), Some(cursor))
            .await;

        // then (期待する結果):
        assert_eq!(page.messages, stored[50..100].to_vec());
        assert!(page.has_more);
        let frames = alice.drain();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "more_messages");
        assert_eq!(frames[0]["roomId"], "general");
        assert_eq!(frames[0]["hasMore"], true);
        assert_eq!(
            frames[0]["messages"][0]["id"],
            stored[50].id.to_string().as_str()
        );
    }

    #[tokio::test]
    async fn test_load_more_with_log_failure_sends_empty_page() {
        // テスト項目: Message Log の障害時は空のページが has_more: false で届く
        // given (前提条件):
        let mut log = MockMessageLog::new();
        log.expect_query_range()
            .returning(|_, _, _| Err(MessageLogError::Storage("unavailable".to_string())));
        let fixture = Fixture::with_log(Arc::new(log));
        let usecase = create_usecase(&fixture);
        let mut alice = fixture.attach("c1").await;

        // when (操作):
        let page = usecase
            .execute(&connection("c1"), &room("general"), Some(Timestamp::new(5)))
            .await;

        // then (期待する結果):
        assert_eq!(page, HistoryPage::empty(room("general")));
        assert_eq!(
            alice.drain(),
            vec![serde_json::json!({
                "type": "more_messages",
                "roomId": "general",
                "messages": [],
                "hasMore": false
            })]
        );
    }
}
