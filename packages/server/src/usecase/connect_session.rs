//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::authenticate() / execute() メソッド
//! - トークン検証と Session Registry への登録、保存済み状態の初期送信
//!
//! ### なぜこのテストが必要か
//! - 認証に失敗した接続が Registry に登録されないことを保証
//! - 新しいタブ・コントローラが次の更新を待たずに同期されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存済み状態のあるユーザー / 無いユーザーの接続
//! - 異常系：トークン無し、検証失敗
//! - エッジケース：既存の兄弟接続には初期状態が再送されない

use std::sync::Arc;

use crate::{
    domain::{
        Connection, ConnectionIdFactory, EventSender, PlaybackStateRepository, SessionRepository,
        Timestamp, TokenVerifier, UserId,
    },
    infrastructure::dto::websocket::{OutboundEvent, PlaybackStateDto},
};

use super::{broadcast::BroadcastRelay, error::ConnectError};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    token_verifier: Arc<dyn TokenVerifier>,
    sessions: Arc<dyn SessionRepository>,
    states: Arc<dyn PlaybackStateRepository>,
    relay: Arc<BroadcastRelay>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        sessions: Arc<dyn SessionRepository>,
        states: Arc<dyn PlaybackStateRepository>,
        relay: Arc<BroadcastRelay>,
    ) -> Self {
        Self {
            token_verifier,
            sessions,
            states,
            relay,
        }
    }

    /// ハンドシェイクのトークンを検証する
    ///
    /// Registry には触れないので、失敗しても共有状態は変化しない。
    pub fn authenticate(&self, token: Option<&str>) -> Result<UserId, ConnectError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConnectError::MissingToken)?;
        Ok(self.token_verifier.verify(token)?)
    }

    /// 認証済みの接続を登録する
    ///
    /// # Arguments
    ///
    /// * `user_id` - 認証済みユーザー
    /// * `sender` - この接続へのメッセージ送信チャンネル
    ///
    /// # Returns
    ///
    /// 登録した接続。ユーザーに保存済みの状態があれば、この接続にだけ `state` を送信済み。
    pub async fn execute(&self, user_id: UserId, sender: EventSender) -> Connection {
        let connection = Connection::new(ConnectionIdFactory::generate(), user_id, Timestamp::now());

        // 1-2 は 1 つの公開区間で行う。兄弟の更新は区間の前か後にしか入らない
        let _publication = self.relay.lock_publication().await;

        // 1. Registry に登録（先に登録してから状態を読むことで、登録後の更新を取りこぼさない）
        self.sessions
            .register(connection.clone(), sender.clone())
            .await;

        // 2. 保存済みの状態があれば新しい接続にだけ送る
        if let Some(state) = self.states.get_state(&connection.user_id).await {
            let event = OutboundEvent::State(PlaybackStateDto::from(&state));
            if !self.relay.send_to(&sender, &event) {
                tracing::warn!(
                    "Connection '{}' closed before the initial state could be sent",
                    connection.id
                );
            }
        }

        connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{AuthError, ConnectionId, MockTokenVerifier, PlaybackState, TransportStatus},
        infrastructure::{
            dto::websocket::StateUpdatePayload,
            repository::{InMemoryPlaybackStateRepository, InMemorySessionRepository},
        },
        usecase::{UpdatePlaybackStateUseCase, error::UpdateStateError},
    };
    use async_trait::async_trait;
    use tokio::{sync::mpsc, task::JoinHandle};

    struct Fixture {
        sessions: Arc<InMemorySessionRepository>,
        states: Arc<InMemoryPlaybackStateRepository>,
        usecase: ConnectSessionUseCase,
    }

    fn create_fixture(verifier: MockTokenVerifier) -> Fixture {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let states = Arc::new(InMemoryPlaybackStateRepository::new());
        let relay = Arc::new(BroadcastRelay::new(sessions.clone()));
        let usecase =
            ConnectSessionUseCase::new(Arc::new(verifier), sessions.clone(), states.clone(), relay);
        Fixture {
            sessions,
            states,
            usecase,
        }
    }

    fn alice() -> UserId {
        UserId::new("alice".to_string()).unwrap()
    }

    #[test]
    fn test_authenticate_success() {
        // テスト項目: 有効なトークンからユーザー ID が得られる
        // given (前提条件):
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .withf(|token: &str| token == "good-token")
            .times(1)
            .returning(|_| Ok(UserId::new("alice".to_string()).unwrap()));
        let fixture = create_fixture(verifier);

        // when (操作):
        let result = fixture.usecase.authenticate(Some("good-token"));

        // then (期待する結果):
        assert_eq!(result, Ok(alice()));
    }

    #[test]
    fn test_authenticate_missing_token() {
        // テスト項目: トークンが無い場合は検証器を呼ばずに MissingToken になる
        // given (前提条件):
        let mut verifier = MockTokenVerifier::new();
        verifier.expect_verify().never();
        let fixture = create_fixture(verifier);

        // when (操作):
        let none = fixture.usecase.authenticate(None);
        let blank = fixture.usecase.authenticate(Some("  "));

        // then (期待する結果):
        assert_eq!(none, Err(ConnectError::MissingToken));
        assert_eq!(blank, Err(ConnectError::MissingToken));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_token_registers_nothing() {
        // テスト項目: 検証に失敗した場合は InvalidToken になり、Registry には何も登録されない
        // given (前提条件):
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Err(AuthError::InvalidToken("ExpiredSignature".to_string())));
        let fixture = create_fixture(verifier);

        // when (操作):
        let result = fixture.usecase.authenticate(Some("expired"));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::InvalidToken("ExpiredSignature".to_string()))
        );
        assert_eq!(fixture.sessions.count_connections().await, 0);
    }

    #[tokio::test]
    async fn test_connect_without_stored_state() {
        // テスト項目: 保存済み状態の無いユーザーが接続すると登録のみ行われ、何も送信されない
        // given (前提条件):
        let fixture = create_fixture(MockTokenVerifier::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        let connection = fixture.usecase.execute(alice(), tx).await;

        // then (期待する結果):
        assert_eq!(connection.user_id, alice());
        assert_eq!(
            fixture.sessions.connections_of(&alice()).await,
            vec![connection.id.clone()]
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_pushes_stored_state_to_new_connection_only() {
        // テスト項目: 保存済み状態があれば新しい接続にだけ state が送られ、既存の接続には送られない
        // given (前提条件):
        let fixture = create_fixture(MockTokenVerifier::new());
        let stored = PlaybackState::new(TransportStatus::Playing, 10.0, 0.0, None).unwrap();
        fixture.states.set_state(alice(), stored.clone()).await;

        let (tx_old, mut rx_old) = mpsc::unbounded_channel();
        fixture.usecase.execute(alice(), tx_old).await;
        rx_old.try_recv().unwrap(); // 既存接続自身の初期状態

        // when (操作):
        let (tx_new, mut rx_new) = mpsc::unbounded_channel();
        fixture.usecase.execute(alice(), tx_new).await;

        // then (期待する結果):
        let frame = rx_new.try_recv().unwrap();
        let event = OutboundEvent::decode(&frame).unwrap();
        assert_eq!(event, OutboundEvent::State(PlaybackStateDto::from(&stored)));
        assert!(rx_old.try_recv().is_err());
        assert_eq!(fixture.sessions.connections_of(&alice()).await.len(), 2);
    }

    /// 読み出しの直後に兄弟接続の state_update を走らせる Store
    struct InterleavingStateStore {
        inner: Arc<InMemoryPlaybackStateRepository>,
        update: std::sync::Mutex<Option<(UpdatePlaybackStateUseCase, ConnectionId)>>,
        pending: std::sync::Mutex<Option<JoinHandle<Result<usize, UpdateStateError>>>>,
    }

    #[async_trait]
    impl PlaybackStateRepository for InterleavingStateStore {
        async fn set_state(&self, user_id: UserId, state: PlaybackState) {
            self.inner.set_state(user_id, state).await;
        }

        async fn get_state(&self, user_id: &UserId) -> Option<PlaybackState> {
            let snapshot = self.inner.get_state(user_id).await;
            let update = self.update.lock().unwrap().take();
            if let Some((usecase, origin)) = update {
                let user_id = user_id.clone();
                let payload: StateUpdatePayload =
                    serde_json::from_value(serde_json::json!({"status": "playing", "position": 99}))
                        .unwrap();
                let handle =
                    tokio::spawn(async move { usecase.execute(&user_id, &origin, payload).await });
                *self.pending.lock().unwrap() = Some(handle);
                // 更新タスクに実行の機会を与える
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            snapshot
        }
    }

    #[tokio::test]
    async fn test_connect_initial_state_never_overtakes_concurrent_update() {
        // テスト項目: 初期スナップショットの読み出し中に兄弟の更新が入っても、新しい接続に最後に届く state は最新値になる
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::new());
        let inner = Arc::new(InMemoryPlaybackStateRepository::new());
        let relay = Arc::new(BroadcastRelay::new(sessions.clone()));
        inner
            .set_state(
                alice(),
                PlaybackState::new(TransportStatus::Paused, 10.0, 0.0, None).unwrap(),
            )
            .await;

        let sibling = ConnectionIdFactory::generate();
        let (tx_sibling, _rx_sibling) = mpsc::unbounded_channel();
        sessions
            .register(
                Connection::new(sibling.clone(), alice(), Timestamp::new(0)),
                tx_sibling,
            )
            .await;

        let store = Arc::new(InterleavingStateStore {
            inner: inner.clone(),
            update: std::sync::Mutex::new(Some((
                UpdatePlaybackStateUseCase::new(inner.clone(), relay.clone()),
                sibling,
            ))),
            pending: std::sync::Mutex::new(None),
        });
        let usecase = ConnectSessionUseCase::new(
            Arc::new(MockTokenVerifier::new()),
            sessions.clone(),
            store.clone(),
            relay,
        );

        // when (操作):
        let (tx, mut rx) = mpsc::unbounded_channel();
        usecase.execute(alice(), tx).await;
        let pending = store.pending.lock().unwrap().take().unwrap();
        pending.await.unwrap().unwrap();

        // then (期待する結果):
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(OutboundEvent::decode(&frame).unwrap());
        }
        let Some(OutboundEvent::State(last)) = frames.last() else {
            panic!("expected a state event, got {frames:?}");
        };
        assert!(last.is_playing);
        assert_eq!(last.current_time, 99.0);
        assert_eq!(inner.get_state(&alice()).await.unwrap().position, 99.0);
    }
}
