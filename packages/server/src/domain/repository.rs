//! Repository traits (ports) owned by the domain layer.
//!
//! The UseCase layer depends on these traits only; concrete stores live in
//! `infrastructure::repository` (dependency inversion).

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    entity::{Connection, PlaybackState},
    error::RepositoryError,
    value_object::{ConnectionId, UserId},
};

/// Outbound channel of one connection. Each item is one serialized text frame.
pub type EventSender = UnboundedSender<String>;

/// Result of removing a connection from the session registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unregistered {
    /// Owner of the removed connection
    pub user_id: UserId,
    /// True when this was the user's last connection and the entry was removed
    pub user_pruned: bool,
}

/// Session Registry: user ⇄ live connections.
///
/// Invariants:
/// - a connection id belongs to at most one user
/// - a user with no connections has no entry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Add a connection to its user's entry, creating the entry if absent
    async fn register(&self, connection: Connection, sender: EventSender);

    /// Remove a connection and prune the user's entry when it becomes empty
    async fn unregister(&self, connection_id: &ConnectionId)
    -> Result<Unregistered, RepositoryError>;

    /// Live connection ids of a user
    async fn connections_of(&self, user_id: &UserId) -> Vec<ConnectionId>;

    /// Snapshot of a user's outbound channels, taken under the registry lock
    async fn senders_of(&self, user_id: &UserId) -> Vec<(ConnectionId, EventSender)>;

    /// Look up a single connection
    async fn get_connection(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// Number of users with at least one live connection
    async fn count_users(&self) -> usize;

    /// Number of live connections across all users
    async fn count_connections(&self) -> usize;
}

/// Playback State Store: one last-writer-wins snapshot per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackStateRepository: Send + Sync {
    /// Replace the user's snapshot wholesale
    async fn set_state(&self, user_id: UserId, state: PlaybackState);

    /// Last stored snapshot, or `None` when the user never reported one
    async fn get_state(&self, user_id: &UserId) -> Option<PlaybackState>;
}
