//! UseCase: リモートコマンドの中継処理
//!
//! コマンドは Store に書き込まず、ユーザーの接続へそのまま中継するだけ。
//! WebSocket の `command` イベントと REST の両方から使われます。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, PlaybackCommand, UserId},
    infrastructure::dto::websocket::{CommandPayload, OutboundEvent},
};

use super::{broadcast::BroadcastRelay, error::RelayCommandError};

/// コマンド中継のユースケース
pub struct RelayCommandUseCase {
    relay: Arc<BroadcastRelay>,
}

impl RelayCommandUseCase {
    /// 新しい RelayCommandUseCase を作成
    pub fn new(relay: Arc<BroadcastRelay>) -> Self {
        Self { relay }
    }

    /// コマンド中継を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 対象ユーザー
    /// * `payload` - 受け取ったコマンド（検証後、そのまま中継）
    /// * `exclude` - 配信しない接続
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 配信できた接続数（0 でも成功）
    /// * `Err(RelayCommandError)` - 未知のコマンド。中継されない
    pub async fn execute(
        &self,
        user_id: &UserId,
        payload: CommandPayload,
        exclude: Option<&ConnectionId>,
    ) -> Result<usize, RelayCommandError> {
        let command = PlaybackCommand::try_from(&payload)?;
        tracing::info!("Relaying command '{}' to '{}'", command, user_id);

        let event = OutboundEvent::Command(payload);
        Ok(self.relay.broadcast(user_id, &event, exclude).await)
    }
}
