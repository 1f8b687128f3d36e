//! InMemory Repository 実装
//!
//! プロセス内の HashMap をストレージとして使用します。プロセス再起動で内容は失われます。

mod playback_state;
mod session;

pub use playback_state::InMemoryPlaybackStateRepository;
pub use session::InMemorySessionRepository;
