//! UseCase: 再生状態の更新処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdatePlaybackStateUseCase::execute() メソッド
//! - ペイロードの正規化、Playback State Store への上書き、送信元を除くブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 送信元へのエコーが起きないことを保証（エコーループ防止）
//! - 連続した更新が last-writer-wins で保存されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：兄弟接続への配信
//! - 異常系：不正なペイロード（保存も配信もされない）

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, PlaybackState, PlaybackStateRepository, Timestamp, UserId},
    infrastructure::dto::websocket::{OutboundEvent, PlaybackStateDto, StateUpdatePayload},
};

use super::{broadcast::BroadcastRelay, error::UpdateStateError};

/// 再生状態更新のユースケース
pub struct UpdatePlaybackStateUseCase {
    states: Arc<dyn PlaybackStateRepository>,
    relay: Arc<BroadcastRelay>,
}

impl UpdatePlaybackStateUseCase {
    /// 新しい UpdatePlaybackStateUseCase を作成
    pub fn new(states: Arc<dyn PlaybackStateRepository>, relay: Arc<BroadcastRelay>) -> Self {
        Self { states, relay }
    }

    /// 再生状態の更新を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 送信元接続の所有者
    /// * `origin` - 送信元接続（配信対象から除外）
    /// * `payload` - `state_update` のペイロード（フラット / ネストのどちらでも可）
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 配信できた兄弟接続の数
    /// * `Err(UpdateStateError)` - ペイロードが不正（Store は変更されない）
    pub async fn execute(
        &self,
        user_id: &UserId,
        origin: &ConnectionId,
        payload: StateUpdatePayload,
    ) -> Result<usize, UpdateStateError> {
        // 1. 正規化
        let state = PlaybackState::try_from(payload)?.stamped(Timestamp::now());
        let event = OutboundEvent::State(PlaybackStateDto::from(&state));

        // 2. Store を丸ごと上書き（3 の配信までを 1 つの公開区間にする）
        let _publication = self.relay.lock_publication().await;
        self.states.set_state(user_id.clone(), state).await;

        // 3. 送信元以外へ配信（書き込みの後）
        Ok(self.relay.broadcast(user_id, &event, Some(origin)).await)
    }
}
