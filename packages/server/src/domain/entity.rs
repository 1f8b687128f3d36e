//! Core domain models for playback-session synchronization.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{
    error::PlaybackError,
    value_object::{ConnectionId, Timestamp, UserId},
};

/// One live real-time connection owned by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Server-assigned connection identifier
    pub id: ConnectionId,
    /// Authenticated owner of the connection
    pub user_id: UserId,
    /// Timestamp when the connection was registered
    pub connected_at: Timestamp,
}

impl Connection {
    /// Create a new connection record
    pub fn new(id: ConnectionId, user_id: UserId, connected_at: Timestamp) -> Self {
        Self {
            id,
            user_id,
            connected_at,
        }
    }
}

/// Transport status of the authoritative player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportStatus {
    Playing,
    #[default]
    Paused,
}

impl TransportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportStatus::Playing => "playing",
            TransportStatus::Paused => "paused",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportStatus::Playing)
    }
}

impl From<bool> for TransportStatus {
    fn from(is_playing: bool) -> Self {
        if is_playing {
            TransportStatus::Playing
        } else {
            TransportStatus::Paused
        }
    }
}

impl FromStr for TransportStatus {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" | "play" => Ok(TransportStatus::Playing),
            "paused" | "pause" | "stopped" => Ok(TransportStatus::Paused),
            other => Err(PlaybackError::UnknownStatus(other.to_string())),
        }
    }
}

/// Kind of media being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl FromStr for MediaKind {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" | "music" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            other => Err(PlaybackError::UnknownMediaKind(other.to_string())),
        }
    }
}

/// Identifier of a media item.
///
/// Catalog ids are numeric, bridges sometimes send opaque strings; both are
/// carried through unchanged. Whole-number floats such as `7.0` are read
/// as numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum MediaId {
    Numeric(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawMediaId {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        match RawMediaId::deserialize(deserializer)? {
            RawMediaId::Integer(id) => Ok(MediaId::Numeric(id)),
            RawMediaId::Float(id)
                if id.fract() == 0.0 && id >= i64::MIN as f64 && id < i64::MAX as f64 =>
            {
                Ok(MediaId::Numeric(id as i64))
            }
            RawMediaId::Float(id) => Err(serde::de::Error::custom(format!(
                "media id {id} is not a whole number"
            ))),
            RawMediaId::Text(id) => Ok(MediaId::Text(id)),
        }
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaId::Numeric(id) => write!(f, "{id}"),
            MediaId::Text(id) => write!(f, "{id}"),
        }
    }
}

/// Identity of the item being played
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaItem {
    pub id: Option<MediaId>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub kind: Option<MediaKind>,
}

impl MediaItem {
    /// True when no identifying field is set
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.kind.is_none()
    }

    /// Field-wise merge where `self` wins and `fallback` fills the gaps
    pub fn or(self, fallback: MediaItem) -> MediaItem {
        MediaItem {
            id: self.id.or(fallback.id),
            title: self.title.or(fallback.title),
            artist: self.artist.or(fallback.artist),
            album: self.album.or(fallback.album),
            kind: self.kind.or(fallback.kind),
        }
    }
}

/// Last-known playback snapshot of a user.
///
/// There is exactly one per user and it is always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    /// Transport status
    pub status: TransportStatus,
    /// Elapsed seconds, never negative and never beyond a known duration
    pub position: f64,
    /// Duration in seconds, `0` when unknown
    pub duration: f64,
    /// What is being played, if the sender said so
    pub item: Option<MediaItem>,
    /// When the server accepted this snapshot
    pub updated_at: Option<Timestamp>,
}

impl PlaybackState {
    /// Create a validated playback state
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::InvalidSeconds` if `position` or `duration` is
    /// negative or not finite. A position past a known duration is clamped.
    pub fn new(
        status: TransportStatus,
        position: f64,
        duration: f64,
        item: Option<MediaItem>,
    ) -> Result<Self, PlaybackError> {
        let position = validate_seconds("position", position)?;
        let duration = validate_seconds("duration", duration)?;
        let position = if duration > 0.0 {
            position.min(duration)
        } else {
            position
        };

        Ok(Self {
            status,
            position,
            duration,
            item: item.filter(|item| !item.is_empty()),
            updated_at: None,
        })
    }

    /// The "nothing playing" state returned when a user has no stored snapshot
    pub fn nothing_playing() -> Self {
        Self::default()
    }

    /// Stamp the time the server accepted this snapshot
    pub fn stamped(mut self, at: Timestamp) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }
}

fn validate_seconds(field: &'static str, value: f64) -> Result<f64, PlaybackError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlaybackError::InvalidSeconds { field, value });
    }
    Ok(value)
}

/// One-shot remote-control instruction for the authoritative player.
///
/// Commands are relayed, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Next,
    Previous,
    Seek(f64),
}

impl PlaybackCommand {
    /// Parse a command name and optional value
    ///
    /// # Errors
    ///
    /// * `PlaybackError::UnknownCommand` for names outside the command set
    /// * `PlaybackError::MissingSeekValue` for `seek` without a valid value
    pub fn parse(name: &str, value: Option<f64>) -> Result<Self, PlaybackError> {
        match name {
            "play" => Ok(PlaybackCommand::Play),
            "pause" => Ok(PlaybackCommand::Pause),
            "next" => Ok(PlaybackCommand::Next),
            "previous" => Ok(PlaybackCommand::Previous),
            "seek" => match value {
                Some(v) if v.is_finite() && v >= 0.0 => Ok(PlaybackCommand::Seek(v)),
                _ => Err(PlaybackError::MissingSeekValue),
            },
            other => Err(PlaybackError::UnknownCommand(other.to_string())),
        }
    }

    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackCommand::Play => "play",
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Next => "next",
            PlaybackCommand::Previous => "previous",
            PlaybackCommand::Seek(_) => "seek",
        }
    }

    /// Seek target, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            PlaybackCommand::Seek(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackCommand::Seek(v) => write!(f, "seek({v})"),
            other => write!(f, "{}", other.name()),
        }
    }
}
