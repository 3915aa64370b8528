//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 受信したメッセージの組み立て、メンバーシップ確認、永続化、ブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - エコーポリシー（送信者を含める/含めない）が設定どおりに働くことを確認
//! - メンバーシップ確認が有効なとき、非メンバーのメッセージが配信されないことを保証
//! - 永続化の失敗がリアルタイム配信を妨げないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：部屋 42 の A, B, C のうち A が送信し、B と C に届く
//! - 正常系：エコー有効時は A 自身にも届く
//! - 異常系：非メンバーの送信、永続化の失敗、フレームのエンコード失敗

use std::sync::Arc;

use roomcast_shared::time::Clock;

use crate::domain::{
    BroadcastReport, ChatMessage, ConnectionHandle, FrameEncoder, MessagePusher, RoomRepository,
};

use super::error::SendMessageError;

/// 送信者自身にもメッセージを配信するか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    #[default]
    ExcludeSender,
    IncludeSender,
}

/// 受信メッセージの扱いに関する設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessagePolicy {
    pub echo: EchoPolicy,
    /// 配信前に送信者が部屋のメンバー（または管理者）か確認する
    pub require_membership: bool,
    /// 配信したメッセージをストアに保存する
    pub persist: bool,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    room_repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    encoder: Arc<dyn FrameEncoder>,
    clock: Arc<dyn Clock>,
    policy: MessagePolicy,
}

impl SendMessageUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        encoder: Arc<dyn FrameEncoder>,
        clock: Arc<dyn Clock>,
        policy: MessagePolicy,
    ) -> Self {
        Self {
            room_repository,
            message_pusher,
            encoder,
            clock,
            policy,
        }
    }

    /// `sender` の部屋へメッセージをブロードキャスト
    ///
    /// 部屋は接続時に固定されたものが使われます。ブロードキャストの
    /// エンキューが完了してから戻るため、同じ送信者からの連続した呼び出しは
    /// 各受信者に送信順で届きます。
    pub async fn execute(
        &self,
        sender: &ConnectionHandle,
        content: String,
    ) -> Result<BroadcastReport, SendMessageError> {
        let message = ChatMessage {
            room_id: sender.room_id(),
            sender: sender.user_id(),
            content,
            server_received_at: self.clock.now(),
        };

        if self.policy.require_membership {
            let allowed = self
                .room_repository
                .is_member(message.room_id, message.sender)
                .await?
                || self
                    .room_repository
                    .is_admin(message.room_id, message.sender)
                    .await?;
            if !allowed {
                return Err(SendMessageError::NotMember(message.room_id));
            }
        }

        if self.policy.persist {
            if let Err(e) = self
                .room_repository
                .save_message(message.room_id, message.sender, &message.content)
                .await
            {
                tracing::error!("Failed to persist message in room {}: {}", message.room_id, e);
            }
        }

        let frame = self.encoder.encode(&message)?;
        let exclude = match self.policy.echo {
            EchoPolicy::ExcludeSender => Some(sender.id()),
            EchoPolicy::IncludeSender => None,
        };

        Ok(self
            .message_pusher
            .broadcast(message.room_id, frame, exclude)
            .await)
    }
}
