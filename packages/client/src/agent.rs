//! Client Session Agent.
//!
//! Owns at most one WebSocket connection to the gateway. The connection
//! lifecycle is an explicit state machine published on a `watch` channel:
//!
//! ```text
//! Disconnected --connect()--> Connecting --handshake--> Connected
//!      ^                          ^  |                      |
//!      |                          |  +--retries exhausted---+
//!      +------disconnect()--------+-------------------------+
//! ```
//!
//! A lost transport goes back to `Connecting` and retries with the
//! configured [`ReconnectPolicy`]. A policy-violation close from the server
//! (authentication rejected) is terminal.

use std::{sync::Arc, time::Duration};

use cadence_server::{
    domain::PlaybackCommand,
    infrastructure::dto::websocket::{
        CommandPayload, InboundEvent, OutboundEvent, PlaybackStateDto, StateUpdatePayload,
    },
};
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderValue, header::AUTHORIZATION},
        protocol::frame::coding::CloseCode,
    },
};

use crate::{error::ClientError, policy::ReconnectPolicy};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub type StateHandler = Box<dyn Fn(PlaybackStateDto) + Send + Sync>;
pub type CommandHandler = Box<dyn Fn(CommandPayload) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:3000/ws`
    pub server_url: String,
    /// Bearer token sent with every handshake
    pub token: String,
    pub reconnect: ReconnectPolicy,
}

impl AgentConfig {
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            token: token.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Handshake request carrying the `Authorization: Bearer` header
    fn request(&self) -> Result<Request, ClientError> {
        let mut request = self
            .server_url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::InvalidUrl {
                url: self.server_url.clone(),
                reason: e.to_string(),
            })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ClientError::InvalidToken)?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        Ok(request)
    }
}

#[derive(Default)]
struct Handlers {
    on_state: Option<StateHandler>,
    on_command: Option<CommandHandler>,
}

/// State shared between the agent handle and its connection task
struct Shared {
    config: AgentConfig,
    status: watch::Sender<ConnectionStatus>,
    handlers: Mutex<Handlers>,
    /// Frames queued for the live connection; `None` unless connected
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    last_error: Mutex<Option<String>>,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Single point of contact between an embedding application and the server.
///
/// Dropping the agent closes its connection.
pub struct SessionAgent {
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

impl SessionAgent {
    pub fn new(config: AgentConfig) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                status,
                handlers: Mutex::new(Handlers::default()),
                outbound: Mutex::new(None),
                last_error: Mutex::new(None),
            }),
            running: Mutex::new(None),
        }
    }

    /// Install the event handlers and start connecting.
    ///
    /// Only the handlers are replaced when the agent is already connecting
    /// or connected; a second connection is never opened.
    pub async fn connect<S, C>(&self, on_state: S, on_command: C)
    where
        S: Fn(PlaybackStateDto) + Send + Sync + 'static,
        C: Fn(CommandPayload) + Send + Sync + 'static,
    {
        {
            let mut handlers = self.shared.handlers.lock().await;
            handlers.on_state = Some(Box::new(on_state));
            handlers.on_command = Some(Box::new(on_command));
        }

        let mut running = self.running.lock().await;
        let started = self.shared.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Disconnected {
                *status = ConnectionStatus::Connecting;
                true
            } else {
                false
            }
        });
        if !started {
            tracing::debug!("Agent already {:?}; handlers replaced", self.status());
            return;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(self.shared.clone(), shutdown_rx));
        *running = Some(Running { shutdown, handle });
    }

    /// Report the full local snapshot. A silent no-op unless connected.
    ///
    /// Returns whether the event was queued for sending.
    pub async fn send_state(&self, state: &PlaybackStateDto) -> Result<bool, ClientError> {
        let payload = StateUpdatePayload::from(state.clone());
        self.send_event(&InboundEvent::StateUpdate(payload)).await
    }

    /// Send a remote-control command. A silent no-op unless connected.
    pub async fn send_command(&self, command: PlaybackCommand) -> Result<bool, ClientError> {
        self.send_event(&InboundEvent::Command(CommandPayload::from(command)))
            .await
    }

    /// Application-level ping; the server answers with `pong`
    pub async fn ping(&self) -> Result<bool, ClientError> {
        self.send_event(&InboundEvent::Ping).await
    }

    /// Close the connection and clear the handlers. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        *self.shared.handlers.lock().await = Handlers::default();

        let mut running = self.running.lock().await;
        if let Some(Running { shutdown, handle }) = running.take() {
            let _ = shutdown.send(());
            if let Err(e) = handle.await {
                tracing::warn!("Connection task ended abnormally: {}", e);
            }
        }
        self.shared.outbound.lock().await.take();
        self.shared
            .status
            .send_replace(ConnectionStatus::Disconnected);
    }

    /// Live transport status, not "ever connected"
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Receiver notified on every status transition
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Wait until the agent reaches `status`; `false` on timeout
    pub async fn wait_for_status(&self, status: ConnectionStatus, timeout: Duration) -> bool {
        let mut rx = self.subscribe();
        matches!(
            tokio::time::timeout(timeout, rx.wait_for(|current| *current == status)).await,
            Ok(Ok(_))
        )
    }

    /// Last error reported by the server or the transport
    pub async fn last_error(&self) -> Option<String> {
        self.shared.last_error.lock().await.clone()
    }

    async fn send_event(&self, event: &InboundEvent) -> Result<bool, ClientError> {
        if !self.is_connected() {
            return Ok(false);
        }
        let outbound = self.shared.outbound.lock().await;
        let Some(tx) = outbound.as_ref() else {
            return Ok(false);
        };
        let text = event.encode()?;
        Ok(tx.send(text).is_ok())
    }
}

enum SessionEnd {
    Shutdown,
    Rejected,
    Lost,
}

/// Connect, serve, back off, retry; until shut down or out of attempts
async fn run(shared: Arc<Shared>, mut shutdown: oneshot::Receiver<()>) {
    let policy = shared.config.reconnect;
    let mut failures: u32 = 0;

    loop {
        shared.status.send_replace(ConnectionStatus::Connecting);
        let attempt = tokio::select! {
            _ = &mut shutdown => break,
            result = open(&shared.config) => result,
        };

        match attempt {
            Ok(ws) => {
                failures = 0;
                match run_session(&shared, ws, &mut shutdown).await {
                    SessionEnd::Shutdown | SessionEnd::Rejected => break,
                    SessionEnd::Lost => {
                        tracing::info!("Connection to '{}' lost", shared.config.server_url);
                    }
                }
            }
            Err(ClientError::WebSocket(e)) => {
                tracing::warn!("Failed to connect to '{}': {}", shared.config.server_url, e);
                *shared.last_error.lock().await = Some(e.to_string());
            }
            Err(e) => {
                tracing::error!("Cannot connect: {}", e);
                *shared.last_error.lock().await = Some(e.to_string());
                break;
            }
        }

        failures += 1;
        if !policy.allows(failures) {
            tracing::warn!("Giving up after {} reconnect attempt(s)", failures - 1);
            break;
        }
        let delay = policy.delay_for(failures);
        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            failures,
            policy.max_attempts
        );
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    shared.outbound.lock().await.take();
    shared.status.send_replace(ConnectionStatus::Disconnected);
}

async fn open(config: &AgentConfig) -> Result<WsStream, ClientError> {
    let request = config.request()?;
    let (ws, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(ws)
}

async fn run_session(
    shared: &Shared,
    ws: WsStream,
    shutdown: &mut oneshot::Receiver<()>,
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    *shared.outbound.lock().await = Some(tx);
    shared.status.send_replace(ConnectionStatus::Connected);
    tracing::info!("Connected to '{}'", shared.config.server_url);

    let end = loop {
        tokio::select! {
            _ = &mut *shutdown => {
                // Flush what was queued before the disconnect
                while let Ok(text) = rx.try_recv() {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                let _ = sink.send(Message::Close(None)).await;
                break SessionEnd::Shutdown;
            }
            Some(text) = rx.recv() => {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!("Failed to send event: {}", e);
                    break SessionEnd::Lost;
                }
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => dispatch(shared, text.as_str()).await,
                Some(Ok(Message::Close(frame))) => {
                    match frame {
                        Some(frame) if frame.code == CloseCode::Policy => {
                            tracing::error!("Server rejected the connection: {}", frame.reason.as_str());
                            break SessionEnd::Rejected;
                        }
                        _ => break SessionEnd::Lost,
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break SessionEnd::Lost;
                }
                None => break SessionEnd::Lost,
            },
        }
    };

    shared.outbound.lock().await.take();
    end
}

/// Hand one server event to the installed handlers
async fn dispatch(shared: &Shared, text: &str) {
    let event = match OutboundEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Ignoring malformed event: {}", e);
            return;
        }
    };

    match event {
        OutboundEvent::State(state) => {
            let handlers = shared.handlers.lock().await;
            if let Some(on_state) = &handlers.on_state {
                on_state(state);
            }
        }
        OutboundEvent::Command(command) => {
            let handlers = shared.handlers.lock().await;
            if let Some(on_command) = &handlers.on_command {
                on_command(command);
            }
        }
        OutboundEvent::Pong => tracing::trace!("pong"),
        OutboundEvent::Error(error) => {
            tracing::warn!("Server error: {}", error.message);
            *shared.last_error.lock().await = Some(error.message);
        }
    }
}
