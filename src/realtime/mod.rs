//! Realtime order notifications over WebSocket.

mod hub;
pub mod protocol;
mod registry;

pub use hub::RealtimeHub;
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{ConnectionId, ConnectionRegistry};
