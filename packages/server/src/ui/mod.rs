//! UI layer: WebSocket gateway and REST facade.

mod extract;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use extract::{AuthenticatedUser, bearer_token};
pub use runner::{build_router, run};
