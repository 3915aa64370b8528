//! UseCase: 参加者接続処理（Admission）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::authorize() / execute() メソッド
//! - 部屋の存在確認、メンバーシップ確認、レジストリへの登録
//!
//! ### なぜこのテストが必要か
//! - Admission に失敗した接続がレジストリに残らないことを保証
//! - メンバーシップ確認ポリシー（有効/無効）の両方の挙動を確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：存在する部屋への接続と登録
//! - 異常系：存在しない部屋、メンバーでないユーザー、登録前に閉じられた接続
//! - エッジケース：authorize と登録の間に部屋が削除された接続は閉じられる
//! - エッジケース：メンバーシップ確認無効時は非メンバーも接続できる

use std::sync::Arc;

use crate::domain::{AuthenticatedUser, ConnectionHandle, RoomId, RoomRegistry, RoomRepository};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    room_repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn RoomRegistry>,
    /// 接続時に部屋のメンバー（または部屋の管理者）であることを要求するか
    require_membership: bool,
}

impl ConnectParticipantUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn RoomRegistry>,
        require_membership: bool,
    ) -> Self {
        Self {
            room_repository,
            registry,
            require_membership,
        }
    }

    /// プロトコルのアップグレード前に接続可否を判定
    ///
    /// 副作用はありません。失敗した場合、接続は一度も登録されません。
    pub async fn authorize(
        &self,
        room_id: RoomId,
        user: &AuthenticatedUser,
    ) -> Result<(), ConnectError> {
        if self.room_repository.load_room(room_id).await?.is_none() {
            return Err(ConnectError::RoomNotFound(room_id));
        }

        if self.require_membership {
            let member = self.room_repository.is_member(room_id, user.user_id).await?
                || self.room_repository.is_admin(room_id, user.user_id).await?;
            if !member {
                return Err(ConnectError::NotMember(room_id));
            }
        }

        Ok(())
    }

    /// アップグレード成功後、接続をレジストリに登録（Active へ遷移）
    ///
    /// 登録後に部屋がまだ存在するか再確認します。`authorize` と登録の間に
    /// 部屋が削除された場合、削除側のスナップショットにこの接続は含まれない
    /// ため、ここで閉じて登録を取り消します。
    pub async fn execute(&self, connection: ConnectionHandle) -> Result<(), ConnectError> {
        let (room_id, connection_id) = (connection.room_id(), connection.id());
        if !self.registry.register(connection.clone()) {
            return Err(ConnectError::ConnectionClosed);
        }

        let still_open = match self.room_repository.load_room(room_id).await {
            Ok(room) => room.is_some(),
            Err(e) => {
                connection.close();
                self.registry.deregister(room_id, connection_id);
                return Err(e.into());
            }
        };
        if !still_open {
            connection.close();
            self.registry.deregister(room_id, connection_id);
            tracing::info!(
                "Connection {} refused: room {} was deleted during admission",
                connection_id,
                room_id
            );
            return Err(ConnectError::RoomNotFound(room_id));
        }

        tracing::info!(
            "Connection {} joined room {} ({} live)",
            connection_id,
            room_id,
            self.registry.room_size(room_id)
        );
        Ok(())
    }
}
