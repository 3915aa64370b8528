//! InMemory RoomRegistry 実装
//!
//! 単一の `std::sync::Mutex` でレジストリ全体を保護します。
//! ロックはマップ操作の間だけ保持し、`.await` をまたいで保持することはありません。
//! そのため非同期ロックではなく同期ロックを使い、`Drop` からも登録解除できます。

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::domain::{ConnectionHandle, ConnectionId, RoomId, RoomRegistry};

type Rooms = HashMap<RoomId, HashMap<ConnectionId, ConnectionHandle>>;

#[derive(Default)]
pub struct InMemoryRoomRegistry {
    rooms: Mutex<Rooms>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // The map is only ever mutated by single insert/remove calls, so a panic in
    // another holder cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Rooms> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoomRegistry for InMemoryRoomRegistry {
    fn register(&self, connection: ConnectionHandle) -> bool {
        let mut rooms = self.lock();
        // checked under the lock: teardown closes before it deregisters, so a
        // closed handle seen here can never be resurrected
        if !connection.is_alive() {
            tracing::warn!(
                "Refusing to register closed connection {} in room {}",
                connection.id(),
                connection.room_id()
            );
            return false;
        }
        let room_id = connection.room_id();
        let connection_id = connection.id();
        rooms
            .entry(room_id)
            .or_default()
            .insert(connection_id, connection);
        tracing::debug!("Connection {} registered in room {}", connection_id, room_id);
        true
    }

    fn deregister(&self, room_id: RoomId, connection_id: ConnectionId) -> Option<ConnectionHandle> {
        let mut rooms = self.lock();
        let members = rooms.get_mut(&room_id)?;
        let removed = members.remove(&connection_id);
        if members.is_empty() {
            rooms.remove(&room_id);
        }
        if removed.is_some() {
            tracing::debug!("Connection {} deregistered from room {}", connection_id, room_id);
        }
        removed
    }

    fn snapshot(&self, room_id: RoomId) -> Vec<ConnectionHandle> {
        self.lock()
            .get(&room_id)
            .map(|members| {
                members
                    .values()
                    .filter(|connection| connection.is_alive())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn room_size(&self, room_id: RoomId) -> usize {
        self.lock().get(&room_id).map_or(0, HashMap::len)
    }

    fn connection_count(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    fn active_rooms(&self) -> Vec<(RoomId, usize)> {
        let mut rooms: Vec<(RoomId, usize)> = self
            .lock()
            .iter()
            .map(|(room_id, members)| (*room_id, members.len()))
            .collect();
        rooms.sort_by_key(|(room_id, _)| *room_id);
        rooms
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{OutboundReceiver, UserId};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - register / deregister / snapshot の基本動作
    // - deregister の冪等性（切断処理と配信失敗処理の競合を想定）
    // - 閉じた接続が登録・スナップショットに現れないこと（復活しない）
    // - 並行アクセス下での整合性
    // ========================================

    fn room(id: i64) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn open(room_id: i64, user_id: i64) -> (ConnectionHandle, OutboundReceiver) {
        ConnectionHandle::open(room(room_id), UserId::new(user_id).unwrap(), 8)
    }

    #[test]
    fn test_register_creates_room_set() {
        // テスト項目: 未知の部屋に登録すると集合が作られスナップショットに現れる
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (conn, _rx) = open(42, 1);

        // when (操作):
        let registered = registry.register(conn.clone());

        // then (期待する結果):
        assert!(registered);
        assert_eq!(registry.snapshot(room(42)), vec![conn]);
        assert_eq!(registry.room_size(room(42)), 1);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_register_same_connection_twice_is_idempotent() {
        // テスト項目: 同じ接続を二度登録しても重複しない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (conn, _rx) = open(42, 1);

        // when (操作):
        registry.register(conn.clone());
        registry.register(conn.clone());

        // then (期待する結果):
        assert_eq!(registry.room_size(room(42)), 1);
    }

    #[test]
    fn test_rooms_are_isolated() {
        // テスト項目: 部屋ごとに独立したメンバー集合が保持される
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (a, _ra) = open(1, 1);
        let (b, _rb) = open(2, 2);

        // when (操作):
        registry.register(a.clone());
        registry.register(b.clone());

        // then (期待する結果):
        assert_eq!(registry.snapshot(room(1)), vec![a]);
        assert_eq!(registry.snapshot(room(2)), vec![b]);
        assert_eq!(registry.active_rooms(), vec![(room(1), 1), (room(2), 1)]);
    }

    #[test]
    fn test_deregister_twice_is_noop() {
        // テスト項目: 二重の deregister はエラーにならず、二回目は何もしない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (conn, _rx) = open(42, 1);
        registry.register(conn.clone());

        // when (操作):
        let first = registry.deregister(room(42), conn.id());
        let second = registry.deregister(room(42), conn.id());

        // then (期待する結果):
        assert_eq!(first, Some(conn));
        assert_eq!(second, None);
        assert!(registry.snapshot(room(42)).is_empty());
    }

    #[test]
    fn test_deregister_unknown_room_is_noop() {
        // テスト項目: 存在しない部屋からの deregister は何もしない
        let registry = InMemoryRoomRegistry::new();
        let (conn, _rx) = open(42, 1);

        assert_eq!(registry.deregister(room(7), conn.id()), None);
    }

    #[test]
    fn test_empty_room_entry_is_dropped() {
        // テスト項目: 最後の接続が抜けた部屋はレジストリから消える
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (conn, _rx) = open(42, 1);
        registry.register(conn.clone());

        // when (操作):
        registry.deregister(room(42), conn.id());

        // then (期待する結果):
        assert!(registry.active_rooms().is_empty());
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_closed_connection_is_never_registered() {
        // テスト項目: 既に閉じた接続は登録されない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (conn, _rx) = open(42, 1);
        conn.close();

        // when (操作):
        let registered = registry.register(conn);

        // then (期待する結果):
        assert!(!registered);
        assert_eq!(registry.room_size(room(42)), 0);
    }

    #[test]
    fn test_snapshot_skips_closed_connections() {
        // テスト項目: 登録後に閉じられた接続はスナップショットに含まれない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (a, _ra) = open(42, 1);
        let (b, _rb) = open(42, 2);
        registry.register(a.clone());
        registry.register(b.clone());

        // when (操作):
        b.close();

        // then (期待する結果):
        assert_eq!(registry.snapshot(room(42)), vec![a]);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        // テスト項目: ロック保持中にパニックしたスレッドがあってもレジストリは使える
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let poisoner = registry.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.rooms.lock().unwrap();
            panic!("poison the registry lock");
        })
        .join();

        // when (操作):
        let (conn, _rx) = open(42, 1);
        let registered = registry.register(conn);

        // then (期待する結果):
        assert!(registered);
        assert_eq!(registry.room_size(room(42)), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_deregister_never_resurrects() {
        // テスト項目: 並行に register / snapshot / deregister しても、
        //             deregister 完了後の接続がスナップショットに現れない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let mut tasks = Vec::new();

        // when (操作):
        for user in 1..=64 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (conn, _rx) = open(42, user);
                registry.register(conn.clone());
                tokio::task::yield_now().await;
                let _ = registry.snapshot(room(42));
                conn.close();
                registry.deregister(room(42), conn.id());
                // the same teardown racing in from a failed delivery
                registry.deregister(room(42), conn.id());
                let after = registry.snapshot(room(42));
                assert!(!after.contains(&conn), "deregistered connection resurfaced");
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.active_rooms().is_empty());
    }
}
