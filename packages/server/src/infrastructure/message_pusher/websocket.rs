//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - RoomRegistry からスナップショットを取得し、各接続の送信キューへ配信する
//! - 配信失敗した接続をレジストリから外し、閉じる
//!
//! ## 設計ノート
//!
//! - スナップショット（コピー）に対して配信し、失敗はまとめて最後に反映します。
//!   反復中にコレクションを変更しません。
//! - 各受信者への配信は並行に行い、待ち時間は DeliveryPolicy で上限を設けます。
//!   遅いクライアントが他のクライアントへの配信を遅らせることはありません。
//! - レジストリのロックは配信中に保持しません。

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::domain::{
    BroadcastReport, ConnectionId, DeliveryPolicy, MessagePusher, RoomId, RoomRegistry,
};

pub struct WebSocketMessagePusher {
    registry: Arc<dyn RoomRegistry>,
    policy: DeliveryPolicy,
}

impl WebSocketMessagePusher {
    pub fn new(registry: Arc<dyn RoomRegistry>, policy: DeliveryPolicy) -> Self {
        Self { registry, policy }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn broadcast(
        &self,
        room_id: RoomId,
        frame: String,
        exclude: Option<ConnectionId>,
    ) -> BroadcastReport {
        let recipients: Vec<_> = self
            .registry
            .snapshot(room_id)
            .into_iter()
            .filter(|connection| Some(connection.id()) != exclude)
            .collect();

        if recipients.is_empty() {
            tracing::debug!("Room {} has no recipients, nothing to broadcast", room_id);
            return BroadcastReport::default();
        }

        let outcomes = join_all(recipients.iter().map(|connection| {
            let frame = frame.clone();
            async move { connection.deliver(frame, self.policy).await }
        }))
        .await;

        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..BroadcastReport::default()
        };
        for (connection, outcome) in recipients.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Dropping connection {} (user {}) from room {}: {}",
                        connection.id(),
                        connection.user_id(),
                        room_id,
                        e
                    );
                    report.failed.push(connection.id());
                }
            }
        }

        // removals are applied only after every delivery attempt has finished
        for connection in recipients.iter().filter(|c| report.failed.contains(&c.id())) {
            connection.close();
            self.registry.deregister(room_id, connection.id());
        }

        tracing::debug!(
            "Broadcast to room {}: {}/{} delivered",
            room_id,
            report.delivered,
            report.recipients
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{ConnectionHandle, OutboundReceiver, UserId},
        infrastructure::registry::InMemoryRoomRegistry,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 部屋の全メンバーへの配信
    // - 一部の接続が失敗しても残りへの配信が続くこと
    // - 失敗した接続がレジストリから外れ、閉じられること
    // - 空の部屋への配信がエラーにならないこと
    // - 同一送信者の連続メッセージの順序が保たれること
    // - 遅い受信者が他の受信者への配信を止めないこと
    // ========================================

    const ROOM: i64 = 42;

    fn room() -> RoomId {
        RoomId::new(ROOM).unwrap()
    }

    fn setup(policy: DeliveryPolicy) -> (Arc<InMemoryRoomRegistry>, WebSocketMessagePusher) {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let pusher = WebSocketMessagePusher::new(registry.clone(), policy);
        (registry, pusher)
    }

    fn join(
        registry: &InMemoryRoomRegistry,
        user_id: i64,
        capacity: usize,
    ) -> (ConnectionHandle, OutboundReceiver) {
        let (conn, rx) = ConnectionHandle::open(room(), UserId::new(user_id).unwrap(), capacity);
        assert!(registry.register(conn.clone()));
        (conn, rx)
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_member() {
        // テスト項目: 部屋の全メンバーにメッセージが届く
        // given (前提条件):
        let (registry, pusher) = setup(DeliveryPolicy::DropWhenFull);
        let (_a, mut rx_a) = join(&registry, 1, 8);
        let (_b, mut rx_b) = join(&registry, 2, 8);

        // when (操作):
        let report = pusher.broadcast(room(), "hello".to_string(), None).await;

        // then (期待する結果):
        assert_eq!(report.recipients, 2);
        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());
        assert_eq!(rx_a.recv().await, Some("hello".to_string()));
        assert_eq!(rx_b.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender_connection() {
        // テスト項目: exclude に指定した接続には配信されない
        // given (前提条件):
        let (registry, pusher) = setup(DeliveryPolicy::DropWhenFull);
        let (a, mut rx_a) = join(&registry, 1, 8);
        let (_b, mut rx_b) = join(&registry, 2, 8);

        // when (操作):
        let report = pusher.broadcast(room(), "hi".to_string(), Some(a.id())).await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(rx_b.recv().await, Some("hi".to_string()));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_room() {
        // テスト項目: メンバーのいない部屋への配信はエラーにならず配信数 0
        // given (前提条件):
        let (_registry, pusher) = setup(DeliveryPolicy::DropWhenFull);

        // when (操作):
        let report = pusher.broadcast(room(), "anyone?".to_string(), None).await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_failed_recipient_is_removed_and_others_still_receive() {
        // テスト項目: 1 接続の書き込みが常に失敗しても残り N-1 に届き、
        //             失敗した接続は以後のスナップショットから消える
        // given (前提条件):
        let (registry, pusher) = setup(DeliveryPolicy::DropWhenFull);
        let (_a, mut rx_a) = join(&registry, 1, 8);
        let (broken, rx_broken) = join(&registry, 2, 8);
        let (_c, mut rx_c) = join(&registry, 3, 8);
        drop(rx_broken);

        // when (操作):
        let report = pusher.broadcast(room(), "hello".to_string(), None).await;

        // then (期待する結果):
        assert_eq!(report.recipients, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, vec![broken.id()]);
        assert_eq!(rx_a.recv().await, Some("hello".to_string()));
        assert_eq!(rx_c.recv().await, Some("hello".to_string()));
        assert!(!broken.is_alive());
        assert!(!registry.snapshot(room()).contains(&broken));
        assert_eq!(registry.room_size(room()), 2);
    }

    #[tokio::test]
    async fn test_full_recipient_is_dropped_then_skipped() {
        // テスト項目: 送信キューが満杯の接続 B は 1 回目の配信で外れ、
        //             2 回目の配信は A と C のみに届く
        // given (前提条件):
        let (registry, pusher) = setup(DeliveryPolicy::DropWhenFull);
        let (_a, mut rx_a) = join(&registry, 1, 8);
        let (b, _rx_b) = join(&registry, 2, 1);
        let (_c, mut rx_c) = join(&registry, 3, 8);
        b.deliver("backlog".to_string(), DeliveryPolicy::DropWhenFull)
            .await
            .unwrap();

        // when (操作):
        let first = pusher.broadcast(room(), "one".to_string(), None).await;
        let second = pusher.broadcast(room(), "two".to_string(), None).await;

        // then (期待する結果):
        assert_eq!(first.failed, vec![b.id()]);
        assert_eq!(second.recipients, 2);
        assert_eq!(second.delivered, 2);
        assert_eq!(rx_a.recv().await, Some("one".to_string()));
        assert_eq!(rx_a.recv().await, Some("two".to_string()));
        assert_eq!(rx_c.recv().await, Some("one".to_string()));
        assert_eq!(rx_c.recv().await, Some("two".to_string()));
    }

    #[tokio::test]
    async fn test_sequential_broadcasts_keep_order() {
        // テスト項目: 同一送信者の連続ブロードキャストは各受信者に送信順で届く
        // given (前提条件):
        let (registry, pusher) = setup(DeliveryPolicy::WaitUpTo(Duration::from_millis(100)));
        let (_a, mut rx_a) = join(&registry, 1, 64);
        let (_b, mut rx_b) = join(&registry, 2, 64);

        // when (操作):
        for i in 0..20 {
            pusher.broadcast(room(), format!("msg-{i}"), None).await;
        }

        // then (期待する結果):
        for i in 0..20 {
            assert_eq!(rx_a.recv().await, Some(format!("msg-{i}")));
            assert_eq!(rx_b.recv().await, Some(format!("msg-{i}")));
        }
    }

    #[tokio::test]
    async fn test_slow_recipient_does_not_delay_others_beyond_timeout() {
        // テスト項目: 応答しない受信者がいても、配信全体はタイムアウト程度で完了する
        // given (前提条件):
        let timeout = Duration::from_millis(50);
        let (registry, pusher) = setup(DeliveryPolicy::WaitUpTo(timeout));
        let (_fast, mut rx_fast) = join(&registry, 1, 8);
        let (stalled, _rx_stalled) = join(&registry, 2, 1);
        stalled
            .deliver("backlog".to_string(), DeliveryPolicy::DropWhenFull)
            .await
            .unwrap();

        // when (操作):
        let started = std::time::Instant::now();
        let report = pusher.broadcast(room(), "hello".to_string(), None).await;
        let elapsed = started.elapsed();

        // then (期待する結果):
        assert_eq!(rx_fast.recv().await, Some("hello".to_string()));
        assert_eq!(report.failed, vec![stalled.id()]);
        assert!(elapsed < Duration::from_secs(1), "broadcast took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_connection_closed_mid_flight_is_cleaned_up() {
        // テスト項目: スナップショット後に閉じられた接続への配信も回復処理される
        // given (前提条件):
        let (registry, pusher) = setup(DeliveryPolicy::DropWhenFull);
        let (a, _rx_a) = join(&registry, 1, 8);
        a.close();

        // when (操作):
        let report = pusher.broadcast(room(), "hello".to_string(), None).await;

        // then (期待する結果):
        // a closed handle is filtered out of the snapshot itself
        assert_eq!(report.recipients, 0);
        assert_eq!(registry.snapshot(room()).len(), 0);
    }
}
