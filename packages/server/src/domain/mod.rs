//! Domain layer for playback-session synchronization.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod auth;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use auth::TokenVerifier;
pub use entity::{
    Connection, MediaId, MediaItem, MediaKind, PlaybackCommand, PlaybackState, TransportStatus,
};
pub use error::{AuthError, PlaybackError, RepositoryError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use repository::{EventSender, PlaybackStateRepository, SessionRepository, Unregistered};
pub use value_object::{ConnectionId, Timestamp, UserId};

#[cfg(test)]
pub use auth::MockTokenVerifier;
#[cfg(test)]
pub use repository::{MockPlaybackStateRepository, MockSessionRepository};
