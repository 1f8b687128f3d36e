//! Debouncing helper for embedders that report state on every player tick.

use cadence_server::{domain::MediaId, infrastructure::dto::websocket::PlaybackStateDto};

/// Passes a snapshot only when something a listener would notice changed:
/// the media id, the transport status, or the whole-second position.
///
/// Bounds state traffic to roughly one event per second while playing.
#[derive(Debug, Default)]
pub struct StateChangeFilter {
    last: Option<(Option<MediaId>, bool, i64)>,
}

impl StateChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_send(&mut self, state: &PlaybackStateDto) -> bool {
        let key = (
            state.media_id.clone(),
            state.is_playing,
            state.current_time.floor() as i64,
        );
        if self.last.as_ref() == Some(&key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    /// Forget the last snapshot so the next one is always sent (e.g. after a reconnect)
    pub fn reset(&mut self) {
        self.last = None;
    }
}
