//! Server state and connection management.

use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::{PlaybackStateRepository, SessionRepository, TokenVerifier},
    infrastructure::repository::{InMemoryPlaybackStateRepository, InMemorySessionRepository},
    usecase::{
        BroadcastRelay, ConnectSessionUseCase, DisconnectSessionUseCase, GetPlaybackStateUseCase,
        RelayCommandUseCase, UpdatePlaybackStateUseCase,
    },
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Access token, used when no `Authorization` header is sent
    pub token: Option<String>,
}

/// Shared application state.
///
/// Constructed explicitly and injected into the router, so each test can run
/// against its own fresh stores.
pub struct AppState {
    /// Session Registry
    pub sessions: Arc<dyn SessionRepository>,
    /// Playback State Store
    pub states: Arc<dyn PlaybackStateRepository>,
    /// External "token → user id" collaborator
    pub token_verifier: Arc<dyn TokenVerifier>,
    /// Fan-out over the Session Registry
    pub relay: Arc<BroadcastRelay>,
}

impl AppState {
    /// Build state backed by fresh in-memory stores
    pub fn new(token_verifier: Arc<dyn TokenVerifier>) -> Self {
        Self::with_repositories(
            token_verifier,
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryPlaybackStateRepository::new()),
        )
    }

    /// Build state over the given repositories
    pub fn with_repositories(
        token_verifier: Arc<dyn TokenVerifier>,
        sessions: Arc<dyn SessionRepository>,
        states: Arc<dyn PlaybackStateRepository>,
    ) -> Self {
        let relay = Arc::new(BroadcastRelay::new(sessions.clone()));
        Self {
            sessions,
            states,
            token_verifier,
            relay,
        }
    }

    pub fn connect_usecase(&self) -> ConnectSessionUseCase {
        ConnectSessionUseCase::new(
            self.token_verifier.clone(),
            self.sessions.clone(),
            self.states.clone(),
            self.relay.clone(),
        )
    }

    pub fn disconnect_usecase(&self) -> DisconnectSessionUseCase {
        DisconnectSessionUseCase::new(self.sessions.clone())
    }

    pub fn update_state_usecase(&self) -> UpdatePlaybackStateUseCase {
        UpdatePlaybackStateUseCase::new(self.states.clone(), self.relay.clone())
    }

    pub fn relay_command_usecase(&self) -> RelayCommandUseCase {
        RelayCommandUseCase::new(self.relay.clone())
    }

    pub fn get_state_usecase(&self) -> GetPlaybackStateUseCase {
        GetPlaybackStateUseCase::new(self.states.clone())
    }
}
