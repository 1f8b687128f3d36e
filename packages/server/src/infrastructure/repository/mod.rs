//! Session Registry / Playback State Store の実装
//!
//! `SessionRepository` と `PlaybackStateRepository`（ドメイン層の trait）を実装します。
//! どちらもストアごとに 1 つの Mutex で更新を直列化し、UseCase 層は trait 経由でのみ利用します。

pub mod inmemory;

pub use inmemory::{InMemoryPlaybackStateRepository, InMemorySessionRepository};
