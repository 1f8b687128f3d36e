//! Client side of Cadence playback synchronization.
//!
//! [`SessionAgent`] is the embedding application's single point of contact:
//! it owns one WebSocket connection to the server, reconnects with bounded
//! backoff, and hands incoming `state` / `command` events to callbacks.

pub mod agent;
pub mod error;
pub mod filter;
pub mod input;
pub mod policy;

pub use agent::{AgentConfig, CommandHandler, ConnectionStatus, SessionAgent, StateHandler};
pub use error::ClientError;
pub use filter::StateChangeFilter;
pub use policy::ReconnectPolicy;
