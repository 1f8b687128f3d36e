//! UseCase: セッション切断処理
//!
//! ### どのような状況を想定しているか
//! - 正常系：兄弟接続が残る切断 / 最後の接続の切断
//! - 異常系：登録されていない接続の切断
//! - 最後の接続が切れても Playback State Store のエントリは残ること

use std::sync::Arc;

use crate::domain::{ConnectionId, SessionRepository, Unregistered};

use super::error::DisconnectError;

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    sessions: Arc<dyn SessionRepository>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// 切断を実行
    ///
    /// 再生状態には触れない。REST の読み出しや再接続時に最後の状態を返せるようにするため。
    ///
    /// # Returns
    ///
    /// * `Ok(Unregistered)` - 接続の所有者と、ユーザーのエントリが削除されたかどうか
    /// * `Err(DisconnectError)` - 接続が登録されていない
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Unregistered, DisconnectError> {
        self.sessions
            .unregister(connection_id)
            .await
            .map_err(|_| DisconnectError::NotRegistered(connection_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Connection, ConnectionIdFactory, PlaybackState, PlaybackStateRepository, Timestamp,
            TransportStatus, UserId,
        },
        infrastructure::repository::{InMemoryPlaybackStateRepository, InMemorySessionRepository},
    };
    use tokio::sync::mpsc;

    fn alice() -> UserId {
        UserId::new("alice".to_string()).unwrap()
    }

    async fn register(repo: &InMemorySessionRepository) -> ConnectionId {
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = Connection::new(ConnectionIdFactory::generate(), alice(), Timestamp::new(0));
        let id = connection.id.clone();
        repo.register(connection, tx).await;
        id
    }

    #[tokio::test]
    async fn test_disconnect_with_remaining_sibling() {
        // テスト項目: 兄弟接続が残る場合、ユーザーのエントリは残る
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::new());
        let usecase = DisconnectSessionUseCase::new(sessions.clone());
        let c1 = register(&sessions).await;
        let c2 = register(&sessions).await;

        // when (操作):
        let result = usecase.execute(&c1).await.unwrap();

        // then (期待する結果):
        assert_eq!(result.user_id, alice());
        assert!(!result.user_pruned);
        assert_eq!(sessions.connections_of(&alice()).await, vec![c2]);
    }

    #[tokio::test]
    async fn test_disconnect_last_connection_keeps_playback_state() {
        // テスト項目: 最後の接続が切断されると Registry のエントリは消えるが、再生状態は残る
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::new());
        let states = InMemoryPlaybackStateRepository::new();
        let usecase = DisconnectSessionUseCase::new(sessions.clone());
        let c1 = register(&sessions).await;
        let state = PlaybackState::new(TransportStatus::Paused, 5.0, 0.0, None).unwrap();
        states.set_state(alice(), state.clone()).await;

        // when (操作):
        let result = usecase.execute(&c1).await.unwrap();

        // then (期待する結果):
        assert!(result.user_pruned);
        assert_eq!(sessions.count_users().await, 0);
        assert_eq!(states.get_state(&alice()).await, Some(state));
    }

    #[tokio::test]
    async fn test_disconnect_unknown_connection() {
        // テスト項目: 登録されていない接続の切断はエラーになる
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::new());
        let usecase = DisconnectSessionUseCase::new(sessions);
        let unknown = ConnectionIdFactory::generate();

        // when (操作):
        let result = usecase.execute(&unknown).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DisconnectError::NotRegistered(unknown.to_string()))
        );
    }
}
