//! Broadcast Relay
//!
//! ユーザーの全接続（任意で送信元を除く）へイベントを配信します。
//! 配信先は Session Registry から取得したスナップショットで、反復中にロックは保持しません。

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    domain::{ConnectionId, EventSender, SessionRepository, UserId},
    infrastructure::dto::websocket::OutboundEvent,
};

/// ユーザー単位のファンアウト
pub struct BroadcastRelay {
    /// Repository（データアクセス層の抽象化）
    sessions: Arc<dyn SessionRepository>,
    /// 状態の書き込み + 配信と、新規接続への初期スナップショット送信を直列化する
    publication: Mutex<()>,
}

impl BroadcastRelay {
    /// 新しい BroadcastRelay を作成
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            publication: Mutex::new(()),
        }
    }

    /// 状態の公開区間を開始する
    ///
    /// ガードを保持している間、他の「Store 書き込み + 配信」や
    /// 「登録 + 初期スナップショット送信」は割り込めない。
    /// 新しい接続に届く最後の state は常に Store の最新値になる。
    pub async fn lock_publication(&self) -> MutexGuard<'_, ()> {
        self.publication.lock().await
    }

    /// `user_id` の全接続へ `event` を配信する
    ///
    /// # Arguments
    ///
    /// * `user_id` - 配信先ユーザー
    /// * `event` - 配信するイベント
    /// * `exclude` - 配信しない接続（送信元）
    ///
    /// # Returns
    ///
    /// 配信できた接続数。切断済みの接続への配信失敗は数えず、残りの配信も止めない。
    pub async fn broadcast(
        &self,
        user_id: &UserId,
        event: &OutboundEvent,
        exclude: Option<&ConnectionId>,
    ) -> usize {
        let payload = match event.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to encode outbound event for '{}': {}", user_id, e);
                return 0;
            }
        };

        let targets = self.sessions.senders_of(user_id).await;
        let mut delivered = 0;
        for (connection_id, sender) in targets {
            if exclude == Some(&connection_id) {
                continue;
            }
            if sender.send(payload.clone()).is_err() {
                tracing::warn!(
                    "Connection '{}' of '{}' is gone, skipping delivery",
                    connection_id,
                    user_id
                );
                continue;
            }
            delivered += 1;
        }

        tracing::debug!("Delivered event to {} connection(s) of '{}'", delivered, user_id);
        delivered
    }

    /// 1 つの接続だけに `event` を送る
    ///
    /// 送信先が閉じていれば `false` を返す。
    pub fn send_to(&self, sender: &EventSender, event: &OutboundEvent) -> bool {
        match event.encode() {
            Ok(payload) => sender.send(payload).is_ok(),
            Err(e) => {
                tracing::warn!("Failed to encode outbound event: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, ConnectionIdFactory, Timestamp},
        infrastructure::repository::InMemorySessionRepository,
    };
    use tokio::sync::mpsc;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn register(
        repo: &InMemorySessionRepository,
        user_id: &UserId,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection::new(
            ConnectionIdFactory::generate(),
            user_id.clone(),
            Timestamp::new(0),
        );
        let id = connection.id.clone();
        repo.register(connection, tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        // テスト項目: exclude に指定した接続以外の全接続に配信される
        // given (前提条件):
        let repo = Arc::new(InMemorySessionRepository::new());
        let relay = BroadcastRelay::new(repo.clone());
        let alice = user("alice");
        let (c1, mut rx1) = register(&repo, &alice).await;
        let (_c2, mut rx2) = register(&repo, &alice).await;
        let (_c3, mut rx3) = register(&repo, &alice).await;

        // when (操作):
        let delivered = relay
            .broadcast(&alice, &OutboundEvent::Pong, Some(&c1))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), r#"{"type":"pong"}"#);
        assert_eq!(rx3.try_recv().unwrap(), r#"{"type":"pong"}"#);
    }

    #[tokio::test]
    async fn test_broadcast_without_exclude_reaches_everyone() {
        // テスト項目: exclude が無い場合は送信元を含む全接続に配信される
        // given (前提条件):
        let repo = Arc::new(InMemorySessionRepository::new());
        let relay = BroadcastRelay::new(repo.clone());
        let alice = user("alice");
        let (_c1, mut rx1) = register(&repo, &alice).await;
        let (_c2, mut rx2) = register(&repo, &alice).await;

        // when (操作):
        let delivered = relay.broadcast(&alice, &OutboundEvent::Pong, None).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_connection() {
        // テスト項目: 閉じた接続への配信失敗は無視され、残りの接続には配信される
        // given (前提条件):
        let repo = Arc::new(InMemorySessionRepository::new());
        let relay = BroadcastRelay::new(repo.clone());
        let alice = user("alice");
        let (_c1, rx1) = register(&repo, &alice).await;
        let (_c2, mut rx2) = register(&repo, &alice).await;
        drop(rx1);

        // when (操作):
        let delivered = relay.broadcast(&alice, &OutboundEvent::Pong, None).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_does_not_cross_users() {
        // テスト項目: 他のユーザーの接続には配信されない
        // given (前提条件):
        let repo = Arc::new(InMemorySessionRepository::new());
        let relay = BroadcastRelay::new(repo.clone());
        let (_a, _rx_a) = register(&repo, &user("alice")).await;
        let (_b, mut rx_b) = register(&repo, &user("bob")).await;

        // when (操作):
        relay
            .broadcast(&user("alice"), &OutboundEvent::Pong, None)
            .await;

        // then (期待する結果):
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_user_without_connections() {
        // テスト項目: 接続の無いユーザーへの配信はエラーにならず 0 件
        // given (前提条件):
        let repo = Arc::new(InMemorySessionRepository::new());
        let relay = BroadcastRelay::new(repo);

        // when (操作):
        let delivered = relay
            .broadcast(&user("nobody"), &OutboundEvent::Pong, None)
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
    }
}
