//! Server startup errors.

use thiserror::Error;

use crate::infrastructure::auth::JwtError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid token configuration: {0}")]
    Jwt(#[from] JwtError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
