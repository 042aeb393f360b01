use std::sync::Arc;

use lasy_pipeline::Pipeline;
use lasy_providers::ai::TextModel;
use lasy_providers::stripe::StripeClient;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lasy_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Background generation and deployment jobs.
    pub pipeline: Arc<Pipeline>,
    /// Model used by the synchronous `/ai` endpoints.
    pub model: Arc<dyn TextModel>,
    pub payments: Arc<StripeClient>,
}
