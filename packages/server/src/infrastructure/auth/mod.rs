//! Token verification implementations.

pub mod jwt;

pub use jwt::{JwtError, JwtTokenVerifier};
