//! Push delivery of job outcomes.
//!
//! The [`PushRouter`] subscribes to the event bus and forwards each
//! project event to the WebSocket connections that joined that project.

pub mod router;

pub use router::PushRouter;
