//! UseCase: 再生状態の取得処理（REST 用）

use std::sync::Arc;

use crate::domain::{PlaybackState, PlaybackStateRepository, UserId};

/// 再生状態取得のユースケース
pub struct GetPlaybackStateUseCase {
    states: Arc<dyn PlaybackStateRepository>,
}

impl GetPlaybackStateUseCase {
    /// 新しい GetPlaybackStateUseCase を作成
    pub fn new(states: Arc<dyn PlaybackStateRepository>) -> Self {
        Self { states }
    }

    /// 保存済みの状態を返す。無ければ「何も再生していない」状態を返す
    pub async fn execute(&self, user_id: &UserId) -> PlaybackState {
        self.states
            .get_state(user_id)
            .await
            .unwrap_or_else(PlaybackState::nothing_playing)
    }
}
