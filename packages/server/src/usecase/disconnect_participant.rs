//! UseCase: 参加者切断処理（Teardown）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 接続を閉じ、レジストリから外すこと
//!
//! ### なぜこのテストが必要か
//! - 受信ループの終了とブロードキャスト失敗の両方から切断処理が走り得るため、
//!   2 回目以降の呼び出しが no-op であることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録中の接続の切断
//! - エッジケース：ブロードキャストエンジンが先に外した接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionHandle, RoomRegistry};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl DisconnectParticipantUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 接続を閉じてからレジストリから外す
    ///
    /// 何度呼んでも安全です。このユースケースが実際にレジストリから外した
    /// 場合のみ `true` を返します。
    pub fn execute(&self, connection: &ConnectionHandle) -> bool {
        connection.close();
        let removed = self
            .registry
            .deregister(connection.room_id(), connection.id())
            .is_some();
        if removed {
            tracing::info!(
                "Connection {} left room {} ({} live)",
                connection.id(),
                connection.room_id(),
                self.registry.room_size(connection.room_id())
            );
        } else {
            tracing::debug!("Connection {} was already deregistered", connection.id());
        }
        removed
    }
}
