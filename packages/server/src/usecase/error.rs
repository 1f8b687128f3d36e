//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{AuthError, PlaybackError};

/// 接続時の認証・登録エラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// トークンが指定されていない
    #[error("Authentication token is missing")]
    MissingToken,

    /// トークンの検証に失敗した
    #[error("Authentication failed: {0}")]
    InvalidToken(String),
}

impl From<AuthError> for ConnectError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingToken => ConnectError::MissingToken,
            AuthError::InvalidToken(reason) => ConnectError::InvalidToken(reason),
        }
    }
}

/// 切断処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisconnectError {
    /// 接続が Session Registry に存在しない
    #[error("Connection is not registered: {0}")]
    NotRegistered(String),
}

/// 再生状態更新のエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UpdateStateError {
    /// ペイロードを正規化できない
    #[error("Invalid playback state: {0}")]
    InvalidState(#[from] PlaybackError),
}

/// コマンド中継のエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayCommandError {
    /// 未知のコマンド、または値が不正
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] PlaybackError),
}
