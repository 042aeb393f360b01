//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`ProjectEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//! Delivery is best-effort: a receiver only sees events published after it
//! subscribed, and there is no replay.

use lasy_core::bundle::CodeBundle;
use lasy_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ProjectEvent
// ---------------------------------------------------------------------------

/// Terminal outcome of a generation or deployment job.
///
/// Serializes as `{"event": "<kind>", "data": {"projectId": .., ...}}`,
/// which is also the frame pushed to WebSocket clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ProjectEvent {
    #[serde(rename_all = "camelCase")]
    CodeGenerated { project_id: DbId, code: CodeBundle },

    #[serde(rename_all = "camelCase")]
    CodeGenerationFailed { project_id: DbId, error: String },

    #[serde(rename_all = "camelCase")]
    DeploymentSuccess { project_id: DbId, url: String },

    #[serde(rename_all = "camelCase")]
    DeploymentFailed { project_id: DbId, error: String },
}

impl ProjectEvent {
    /// The project this event is addressed to.
    pub fn project_id(&self) -> DbId {
        match self {
            Self::CodeGenerated { project_id, .. }
            | Self::CodeGenerationFailed { project_id, .. }
            | Self::DeploymentSuccess { project_id, .. }
            | Self::DeploymentFailed { project_id, .. } => *project_id,
        }
    }

    /// Wire name of the event kind, e.g. `"code-generated"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CodeGenerated { .. } => "code-generated",
            Self::CodeGenerationFailed { .. } => "code-generation-failed",
            Self::DeploymentSuccess { .. } => "deployment-success",
            Self::DeploymentFailed { .. } => "deployment-failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Sink for job outcome events.
///
/// Job runners receive an `Arc<dyn Notifier>` at construction so tests can
/// substitute a recording fake for the live bus.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: ProjectEvent);
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ProjectEvent`].
pub struct EventBus {
    sender: broadcast::Sender<ProjectEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ProjectEvent) {
        tracing::debug!(
            project_id = event.project_id(),
            event = event.kind(),
            receivers = self.sender.receiver_count(),
            "Publishing project event"
        );
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for EventBus {
    fn notify(&self, event: ProjectEvent) {
        self.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
