//! Playback-session synchronization server.
//!
//! Keeps one user's playback state consistent across every tab and controller
//! bridge that user has open, and relays remote-control commands between them.
//!
//! Layers:
//! - `domain`: entities, value objects and ports
//! - `usecase`: connect / disconnect / state update / command relay
//! - `infrastructure`: in-memory stores, JWT verification, wire DTOs
//! - `ui`: axum WebSocket gateway and REST facade

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::{build_router, run, state::AppState};
