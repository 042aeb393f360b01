//! Event-to-socket fan-out.

use std::sync::Arc;

use lasy_events::ProjectEvent;
use tokio::sync::broadcast;

use crate::ws::protocol::text_frame;
use crate::ws::WsManager;

/// Forwards [`ProjectEvent`]s to subscribed WebSocket connections.
///
/// A single router task consumes the bus, so every connection sees a
/// project's events in publish order.
pub struct PushRouter {
    ws_manager: Arc<WsManager>,
}

impl PushRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](lasy_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<ProjectEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Push router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, push router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &ProjectEvent) {
        let frame = match text_frame(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, event = event.kind(), "Failed to encode event");
                return;
            }
        };

        let project_id = event.project_id();
        let delivered = self.ws_manager.send_to_project(project_id, frame).await;
        tracing::debug!(project_id, event = event.kind(), delivered, "Pushed project event");
    }
}
