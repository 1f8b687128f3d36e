//! HTTP API request and response DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/playback/command`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequestDto {
    pub command: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// Response of an accepted command (fire-and-forget)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAcceptedDto {
    pub status: String,
    /// Number of live connections the command was handed to
    pub delivered: usize,
}

/// Error body for 4xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
}

/// Caller's live connections for `GET /api/sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryDto {
    pub user_id: String,
    pub connections: Vec<ConnectionDetailDto>,
}

/// One live connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetailDto {
    pub connection_id: String,
    pub connected_at: String, // ISO 8601
}
