//! InMemory Session Registry 実装
//!
//! ユーザー → 接続 ID 集合、接続 ID → (接続情報, 送信チャンネル) の 2 つのマップを
//! 1 つの Mutex で保護します。登録・削除の途中状態が他のタスクから見えることはありません。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, EventSender, RepositoryError, SessionRepository, Unregistered,
    UserId,
};

struct ConnectionEntry {
    connection: Connection,
    sender: EventSender,
}

#[derive(Default)]
struct Registry {
    users: HashMap<UserId, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl Registry {
    /// Detach a connection id from its owner's set. Returns the owner and
    /// whether the owner's entry was pruned.
    fn detach(&mut self, connection_id: &ConnectionId) -> Option<Unregistered> {
        let entry = self.connections.remove(connection_id)?;
        let user_id = entry.connection.user_id;

        let user_pruned = match self.users.get_mut(&user_id) {
            Some(set) => {
                set.remove(connection_id);
                set.is_empty()
            }
            None => false,
        };
        if user_pruned {
            self.users.remove(&user_id);
        }

        Some(Unregistered {
            user_id,
            user_pruned,
        })
    }
}

/// インメモリ Session Registry 実装
///
/// ドメイン層の SessionRepository trait を実装します（依存性の逆転）。
#[derive(Default)]
pub struct InMemorySessionRepository {
    registry: Mutex<Registry>,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn register(&self, connection: Connection, sender: EventSender) {
        let mut registry = self.registry.lock().await;

        // A connection id has at most one owner: re-registering moves it.
        registry.detach(&connection.id);

        registry
            .users
            .entry(connection.user_id.clone())
            .or_default()
            .insert(connection.id.clone());
        registry
            .connections
            .insert(connection.id.clone(), ConnectionEntry { connection, sender });
    }

    async fn unregister(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Unregistered, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry
            .detach(connection_id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(connection_id.to_string()))
    }

    async fn connections_of(&self, user_id: &UserId) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        registry
            .users
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn senders_of(&self, user_id: &UserId) -> Vec<(ConnectionId, EventSender)> {
        let registry = self.registry.lock().await;
        let Some(set) = registry.users.get(user_id) else {
            return Vec::new();
        };
        set.iter()
            .filter_map(|id| {
                registry
                    .connections
                    .get(id)
                    .map(|entry| (id.clone(), entry.sender.clone()))
            })
            .collect()
    }

    async fn get_connection(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let registry = self.registry.lock().await;
        registry
            .connections
            .get(connection_id)
            .map(|entry| entry.connection.clone())
    }

    async fn count_users(&self) -> usize {
        self.registry.lock().await.users.len()
    }

    async fn count_connections(&self) -> usize {
        self.registry.lock().await.connections.len()
    }
}
