//! Token verification port.

use super::{error::AuthError, value_object::UserId};

/// Verifies an opaque access token and yields the user it was issued to.
///
/// Implementations must be fast and local (signature check, no network I/O):
/// the gateway calls this on the connect path.
#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}
