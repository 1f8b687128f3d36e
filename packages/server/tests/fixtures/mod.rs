//! Shared helpers for integration tests.
//!
//! Each `TestServer` runs the real router on an ephemeral port with its own
//! fresh stores.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use cadence_server::{
    AppState, build_router,
    domain::UserId,
    infrastructure::{
        auth::JwtTokenVerifier,
        dto::websocket::{InboundEvent, OutboundEvent},
    },
};
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};

pub const TEST_SECRET: &str = "cadence_integration_test_secret_long_enough";

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestServer {
    addr: SocketAddr,
    verifier: JwtTokenVerifier,
    pub state: Arc<AppState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let verifier = JwtTokenVerifier::new(TEST_SECRET).expect("Failed to create verifier");
        let state = Arc::new(AppState::new(Arc::new(verifier.clone())));
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            addr,
            verifier,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn token_for(&self, user: &str) -> String {
        let user_id = UserId::new(user.to_string()).expect("Invalid user id");
        self.verifier
            .issue_token(&user_id, Duration::from_secs(600))
            .expect("Failed to issue token")
    }

    /// Connect with `?token=` and wait until the connection is registered.
    ///
    /// Returns the socket and any events received before registration was
    /// confirmed (e.g. the initial stored state).
    pub async fn connect_ready(&self, user: &str) -> (WsStream, Vec<OutboundEvent>) {
        let url = format!("{}?token={}", self.ws_url(), self.token_for(user));
        let (mut ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("Failed to connect");
        let before = ping_until_pong(&mut ws).await;
        (ws, before)
    }

    /// Connect with an `Authorization: Bearer` header
    pub async fn connect_with_header(&self, token: &str) -> WsStream {
        let mut request = self
            .ws_url()
            .into_client_request()
            .expect("Invalid request");
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid header"),
        );
        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .expect("Failed to connect");
        ws
    }

    /// Connect without waiting for registration
    pub async fn connect_raw(&self, query: &str) -> WsStream {
        let (ws, _) = tokio_tungstenite::connect_async(format!("{}{}", self.ws_url(), query))
            .await
            .expect("Failed to connect");
        ws
    }

    /// Poll until `check` holds or the timeout elapses
    pub async fn eventually<F, Fut>(&self, check: F) -> bool
    where
        F: Fn(Arc<AppState>) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if check(self.state.clone()).await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn send_event(ws: &mut WsStream, event: &InboundEvent) {
    let text = event.encode().expect("Failed to encode event");
    ws.send(Message::Text(text.into()))
        .await
        .expect("Failed to send");
}

pub async fn send_raw(ws: &mut WsStream, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send");
}

/// Next raw frame, or `None` on timeout / end of stream
pub async fn recv_message(ws: &mut WsStream) -> Option<Message> {
    match tokio::time::timeout(RECV_TIMEOUT, ws.next()).await {
        Ok(Some(Ok(msg))) => Some(msg),
        _ => None,
    }
}

/// Next application event, skipping transport-level frames
pub async fn recv_event(ws: &mut WsStream) -> Option<OutboundEvent> {
    loop {
        match recv_message(ws).await? {
            Message::Text(text) => {
                return Some(OutboundEvent::decode(text.as_str()).expect("Invalid event"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Send a `ping` and collect every event received before the matching `pong`.
///
/// Events on one connection are FIFO, so anything queued for this connection
/// before the ping was handled shows up in the returned list.
pub async fn ping_until_pong(ws: &mut WsStream) -> Vec<OutboundEvent> {
    send_event(ws, &InboundEvent::Ping).await;
    let mut before = Vec::new();
    loop {
        match recv_event(ws).await {
            Some(OutboundEvent::Pong) => return before,
            Some(other) => before.push(other),
            None => panic!("Connection closed before pong"),
        }
    }
}
