//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod broadcast;
pub mod connect_session;
pub mod disconnect_session;
pub mod error;
pub mod get_playback_state;
pub mod relay_command;
pub mod update_playback_state;

pub use broadcast::BroadcastRelay;
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{ConnectError, DisconnectError, RelayCommandError, UpdateStateError};
pub use get_playback_state::GetPlaybackStateUseCase;
pub use relay_command::RelayCommandUseCase;
pub use update_playback_state::UpdatePlaybackStateUseCase;
