//! HTTP API endpoint handlers (REST facade).

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use cadence_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    infrastructure::dto::{
        http::{
            CommandAcceptedDto, CommandRequestDto, ConnectionDetailDto, ErrorResponseDto,
            SessionSummaryDto,
        },
        websocket::{CommandPayload, PlaybackStateDto},
    },
    ui::{extract::AuthenticatedUser, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Last stored playback state of the caller, or the "nothing playing" default
pub async fn get_playback_state(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Json<PlaybackStateDto> {
    let playback = state.get_state_usecase().execute(&user_id).await;
    Json(PlaybackStateDto::from(&playback))
}

/// Relay a one-shot command to every live connection of the caller.
///
/// Fire-and-forget: succeeds even when no connection receives it.
pub async fn post_playback_command(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommandRequestDto>,
) -> Result<(StatusCode, Json<CommandAcceptedDto>), (StatusCode, Json<ErrorResponseDto>)> {
    let payload = CommandPayload {
        command: request.command,
        value: request.value,
    };

    match state
        .relay_command_usecase()
        .execute(&user_id, payload, None)
        .await
    {
        Ok(delivered) => Ok((
            StatusCode::ACCEPTED,
            Json(CommandAcceptedDto {
                status: "accepted".to_string(),
                delivered,
            }),
        )),
        Err(e) => {
            tracing::warn!("Rejected command from '{}': {}", user_id, e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponseDto {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Live connections of the caller
pub async fn get_sessions(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Json<SessionSummaryDto> {
    let mut connections = Vec::new();
    for connection_id in state.sessions.connections_of(&user_id).await {
        if let Some(connection) = state.sessions.get_connection(&connection_id).await {
            connections.push(ConnectionDetailDto {
                connection_id: connection.id.to_string(),
                connected_at: timestamp_to_jst_rfc3339(connection.connected_at.value())
                    .unwrap_or_default(),
            });
        }
    }
    // Sort by connected_at for consistent ordering
    connections.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));

    Json(SessionSummaryDto {
        user_id: user_id.into_string(),
        connections,
    })
}
