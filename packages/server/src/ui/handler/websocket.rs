//! WebSocket connection handlers (Connection Gateway).

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        rejection::QueryRejection,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, EventSender, UserId},
    infrastructure::dto::websocket::{InboundEvent, OutboundEvent},
    ui::{
        extract::bearer_token,
        state::{AppState, ConnectQuery},
    },
    usecase::{ConnectError, RelayCommandError},
};

/// Close code sent after an authentication failure (policy violation)
const CLOSE_POLICY_VIOLATION: u16 = 1008;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    query: Result<Query<ConnectQuery>, QueryRejection>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // An unparsable query string carries no usable token
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::debug!("Ignoring malformed WebSocket query string: {}", e);
            ConnectQuery::default()
        }
    };

    // Header wins over query string
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or(query.token);

    // Verification is a local signature check and holds no store lock.
    let auth = state.connect_usecase().authenticate(token.as_deref());

    ws.on_upgrade(move |socket| async move {
        match auth {
            Ok(user_id) => handle_socket(socket, state, user_id).await,
            Err(e) => reject_socket(socket, e).await,
        }
    })
}

/// Report an authentication failure in-band, then close
async fn reject_socket(mut socket: WebSocket, error: ConnectError) {
    tracing::warn!("Rejecting WebSocket connection: {}", error);

    if let Ok(json) = OutboundEvent::error(error.to_string()).encode() {
        let _ = socket.send(Message::Text(json.into())).await;
    }
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: CLOSE_POLICY_VIOLATION,
            reason: "authentication failed".into(),
        })))
        .await;
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Register; a stored snapshot, if any, is queued on `tx` for this connection only
    let connection = state.connect_usecase().execute(user_id, tx.clone()).await;
    tracing::info!(
        "Connection '{}' of '{}' connected and registered",
        connection.id,
        connection.user_id
    );

    // Spawn a task to forward queued events to this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Spawn a task to receive events from this connection
    let recv_state = state.clone();
    let recv_connection = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_connection.id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text(&recv_state, &recv_connection, &tx, text.as_str()).await;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::trace!("Received transport ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_connection.id);
                    break;
                }
                _ => {
                    tracing::debug!("Ignoring non-text frame from '{}'", recv_connection.id);
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    match state.disconnect_usecase().execute(&connection.id).await {
        Ok(unregistered) => {
            tracing::info!(
                "Connection '{}' of '{}' disconnected (last connection: {})",
                connection.id,
                unregistered.user_id,
                unregistered.user_pruned
            );
        }
        Err(e) => {
            tracing::warn!("Failed to unregister '{}': {}", connection.id, e);
        }
    }
}

/// Route one inbound text frame.
///
/// Malformed frames are dropped; nothing here can affect other users.
async fn handle_text(state: &AppState, connection: &Connection, tx: &EventSender, text: &str) {
    let event = match InboundEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Dropping malformed frame from '{}': {}", connection.id, e);
            return;
        }
    };

    match event {
        InboundEvent::StateUpdate(payload) => {
            match state
                .update_state_usecase()
                .execute(&connection.user_id, &connection.id, payload)
                .await
            {
                Ok(delivered) => tracing::debug!(
                    "State update from '{}' relayed to {} sibling(s)",
                    connection.id,
                    delivered
                ),
                Err(e) => {
                    tracing::warn!("Dropping state update from '{}': {}", connection.id, e)
                }
            }
        }
        InboundEvent::Command(payload) => {
            match state
                .relay_command_usecase()
                .execute(&connection.user_id, payload, None)
                .await
            {
                Ok(_) => {}
                Err(RelayCommandError::InvalidCommand(e)) => {
                    tracing::warn!("Rejected command from '{}': {}", connection.id, e);
                    state
                        .relay
                        .send_to(tx, &OutboundEvent::error(e.to_string()));
                }
            }
        }
        InboundEvent::Ping => {
            tracing::debug!("Received ping from '{}'", connection.id);
            state.relay.send_to(tx, &OutboundEvent::Pong);
        }
    }
}
