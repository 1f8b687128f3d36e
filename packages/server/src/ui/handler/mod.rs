//! Axum handlers: the WebSocket gateway and the REST facade.

pub mod http;
pub mod websocket;

pub use http::{get_playback_state, get_sessions, health_check, post_playback_command};
pub use websocket::websocket_handler;
