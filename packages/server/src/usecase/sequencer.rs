//! ルームイベントの直列化
//!
//! メンバー・タイピング集合の変更と、その結果のスナップショットの通知を
//! 1 つのクリティカルセクションで行うためのゲート。ゲートを通った順に変更と通知が
//! 完了するので、古いスナップショットが新しいものの後に届くことはない。
//! Message Log へのアクセス（履歴の読み込み・追記）はゲートの外で行う。

use tokio::sync::{Mutex, MutexGuard};

/// ルームの変更と通知を直列化するゲート
#[derive(Debug, Default)]
pub struct RoomEventSequencer {
    gate: Mutex<()>,
}

impl RoomEventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// ゲートに入る。ガードを保持している間、他のルームイベントは待たされる
    pub async fn enter(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    #[tokio::test]
    async fn test_enter_serializes_in_arrival_order() {
        // テスト項目: ゲートに入った順に処理が完了する
        // given (前提条件):
        let sequencer = Arc::new(RoomEventSequencer::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        // when (操作):
        let first = {
            let sequencer = sequencer.clone();
            let order = order.clone();
            async move {
                let _turn = sequencer.enter().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                order.lock().await.push("first");
            }
        };
        let second = {
            let sequencer = sequencer.clone();
            let order = order.clone();
            async move {
                let _turn = sequencer.enter().await;
                order.lock().await.push("second");
            }
        };
        tokio::join!(first, second);

        // then (期待する結果):
        assert_eq!(*order.lock().await, vec!["first", "second"]);
    }
}
