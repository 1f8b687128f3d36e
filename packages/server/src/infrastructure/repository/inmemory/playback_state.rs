//! InMemory Playback State Store 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{PlaybackState, PlaybackStateRepository, UserId};

/// インメモリ Playback State Store 実装
///
/// ユーザーごとに最後に書き込まれたスナップショットを 1 つだけ保持します（last-writer-wins）。
/// エントリは削除されません。
#[derive(Default)]
pub struct InMemoryPlaybackStateRepository {
    states: Mutex<HashMap<UserId, PlaybackState>>,
}

impl InMemoryPlaybackStateRepository {
    /// 新しい InMemoryPlaybackStateRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaybackStateRepository for InMemoryPlaybackStateRepository {
    async fn set_state(&self, user_id: UserId, state: PlaybackState) {
        let mut states = self.states.lock().await;
        states.insert(user_id, state);
    }

    async fn get_state(&self, user_id: &UserId) -> Option<PlaybackState> {
        let states = self.states.lock().await;
        states.get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MediaId, MediaItem, TransportStatus};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_get_state_absent() {
        // テスト項目: 一度も書き込まれていないユーザーの状態は None
        // given (前提条件):
        let repo = InMemoryPlaybackStateRepository::new();

        // when (操作):
        let state = repo.get_state(&user("alice")).await;

        // then (期待する結果):
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_set_state_last_writer_wins() {
        // テスト項目: 連続した書き込みでは最後の状態のみが保持され、マージされない
        // given (前提条件):
        let repo = InMemoryPlaybackStateRepository::new();
        let alice = user("alice");
        let first = PlaybackState::new(
            TransportStatus::Playing,
            10.0,
            100.0,
            Some(MediaItem {
                id: Some(MediaId::Numeric(1)),
                title: Some("First".to_string()),
                artist: Some("Someone".to_string()),
                ..MediaItem::default()
            }),
        )
        .unwrap();
        let second = PlaybackState::new(
            TransportStatus::Paused,
            3.0,
            0.0,
            Some(MediaItem {
                id: Some(MediaId::Numeric(2)),
                ..MediaItem::default()
            }),
        )
        .unwrap();

        // when (操作):
        repo.set_state(alice.clone(), first).await;
        repo.set_state(alice.clone(), second.clone()).await;

        // then (期待する結果): artist は second に含まれていないので残らない
        let stored = repo.get_state(&alice).await.unwrap();
        assert_eq!(stored, second);
        assert_eq!(stored.item.unwrap().artist, None);
    }

    #[tokio::test]
    async fn test_states_are_isolated_per_user() {
        // テスト項目: ユーザーごとに状態が独立している
        // given (前提条件):
        let repo = InMemoryPlaybackStateRepository::new();
        let state = PlaybackState::new(TransportStatus::Playing, 1.0, 0.0, None).unwrap();

        // when (操作):
        repo.set_state(user("alice"), state.clone()).await;

        // then (期待する結果):
        assert_eq!(repo.get_state(&user("alice")).await, Some(state));
        assert_eq!(repo.get_state(&user("bob")).await, None);
    }
}
