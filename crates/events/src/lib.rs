//! Lasy project event bus.
//!
//! - [`ProjectEvent`]: outcome of a background job, addressed to one project.
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`Notifier`]: the narrow publishing interface job runners depend on.

pub mod bus;

pub use bus::{EventBus, Notifier, ProjectEvent};
