//! WebSocket event DTOs.
//!
//! Every frame is a JSON text message of the form
//! `{"type": "<event>", "payload": {...}}`. `ping` and `pong` carry no payload.

use serde::{Deserialize, Serialize};

use crate::domain::{
    MediaId, MediaItem, MediaKind, PlaybackCommand, PlaybackError, PlaybackState, TransportStatus,
};

/// Events sent by a client to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundEvent {
    StateUpdate(StateUpdatePayload),
    Command(CommandPayload),
    Ping,
}

impl InboundEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Events sent by the gateway to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    State(PlaybackStateDto),
    Command(CommandPayload),
    Pong,
    Error(ErrorPayload),
}

impl OutboundEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn error(message: impl Into<String>) -> Self {
        OutboundEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

/// Nested item identity inside a `state_update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaItemDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MediaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(
        rename = "type",
        alias = "kind",
        alias = "mediaType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub media_type: Option<String>,
}

/// `state_update` payload.
///
/// Accepts either flat fields, a nested `item` (alias `media`), or both.
/// Normalization rules:
/// - nested item fields win over flat fields
/// - `status` wins over `isPlaying`
/// - a transport status and a position are required
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    #[serde(alias = "currentTime", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<MediaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(alias = "media", default, skip_serializing_if = "Option::is_none")]
    pub item: Option<MediaItemDto>,
}

fn parse_kind(raw: Option<String>) -> Result<Option<MediaKind>, PlaybackError> {
    raw.map(|s| s.parse()).transpose()
}

impl TryFrom<StateUpdatePayload> for PlaybackState {
    type Error = PlaybackError;

    fn try_from(payload: StateUpdatePayload) -> Result<Self, Self::Error> {
        let status = match (payload.status, payload.is_playing) {
            (Some(status), _) => status.parse::<TransportStatus>()?,
            (None, Some(is_playing)) => TransportStatus::from(is_playing),
            (None, None) => return Err(PlaybackError::MissingStatus),
        };
        let position = payload.position.ok_or(PlaybackError::MissingPosition)?;
        let duration = payload.duration.unwrap_or(0.0);

        let flat = MediaItem {
            id: payload.media_id,
            title: payload.title,
            artist: payload.artist,
            album: payload.album,
            kind: parse_kind(payload.media_type)?,
        };
        let item = match payload.item {
            Some(nested) => MediaItem {
                id: nested.id,
                title: nested.title,
                artist: nested.artist,
                album: nested.album,
                kind: parse_kind(nested.media_type)?,
            }
            .or(flat),
            None => flat,
        };

        PlaybackState::new(status, position, duration, Some(item))
    }
}

impl From<PlaybackStateDto> for StateUpdatePayload {
    fn from(dto: PlaybackStateDto) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        StateUpdatePayload {
            status: Some(if dto.is_playing { "playing" } else { "paused" }.to_string()),
            is_playing: None,
            position: Some(dto.current_time),
            duration: Some(dto.duration),
            media_id: None,
            title: None,
            artist: None,
            album: None,
            media_type: None,
            item: Some(MediaItemDto {
                id: dto.media_id,
                title: non_empty(dto.title),
                artist: non_empty(dto.artist),
                album: non_empty(dto.album),
                media_type: dto.media_type.map(|kind| kind.as_str().to_string()),
            }),
        }
    }
}

/// Canonical playback snapshot as seen by clients and the REST read endpoint.
///
/// Optional fields are omitted when absent, so the "nothing playing" value
/// serializes to exactly
/// `{"isPlaying":false,"currentTime":0.0,"duration":0.0,"title":"","artist":"","album":""}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStateDto {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<MediaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    /// Unix milliseconds when the server accepted the snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl From<&PlaybackState> for PlaybackStateDto {
    fn from(state: &PlaybackState) -> Self {
        let item = state.item.clone().unwrap_or_default();
        PlaybackStateDto {
            is_playing: state.is_playing(),
            current_time: state.position,
            duration: state.duration,
            title: item.title.unwrap_or_default(),
            artist: item.artist.unwrap_or_default(),
            album: item.album.unwrap_or_default(),
            media_id: item.id,
            media_type: item.kind,
            updated_at: state.updated_at.map(|ts| ts.value()),
        }
    }
}

/// `command` payload, both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl TryFrom<&CommandPayload> for PlaybackCommand {
    type Error = PlaybackError;

    fn try_from(payload: &CommandPayload) -> Result<Self, Self::Error> {
        PlaybackCommand::parse(&payload.command, payload.value)
    }
}

impl From<PlaybackCommand> for CommandPayload {
    fn from(command: PlaybackCommand) -> Self {
        CommandPayload {
            command: command.name().to_string(),
            value: command.value(),
        }
    }
}

/// `error` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}
