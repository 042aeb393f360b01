//! WebSocket infrastructure for pushing job outcomes to browsers.
//!
//! Provides connection management with per-project subscriptions, the
//! client/server frame types, heartbeat monitoring, and the HTTP upgrade
//! handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
