use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use lasy_core::error::CoreError;
use lasy_core::types::DbId;
use lasy_db::repositories::ProjectRepo;
use lasy_db::DbPool;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::manager::WsManager;
use crate::ws::protocol::{text_frame, ClientMessage, ServerMessage};

/// Query parameters of the upgrade request. Browsers cannot set headers on
/// a WebSocket handshake, so the JWT travels in the URL.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// GET /api/v1/ws?token=<jwt>
///
/// Authenticates before upgrading; an invalid token gets a plain 401.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<Response> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let user = AuthUser::from_token(&state, &token).await?;

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state.pool, state.ws_manager, user.user_id)
    }))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes join/leave frames on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(
    socket: WebSocket,
    pool: DbPool,
    ws_manager: Arc<WsManager>,
    user_id: DbId,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply =
                    handle_client_frame(&pool, &ws_manager, &conn_id, user_id, text.as_str())
                        .await;
                match text_frame(&reply) {
                    Ok(frame) => {
                        ws_manager.send_to(&conn_id, frame).await;
                    }
                    Err(e) => {
                        tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode reply");
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Apply one inbound frame and build the acknowledgement.
async fn handle_client_frame(
    pool: &DbPool,
    ws_manager: &WsManager,
    conn_id: &str,
    user_id: DbId,
    text: &str,
) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Unrecognised WebSocket frame");
            return ServerMessage::error("Unrecognised message");
        }
    };

    match message {
        ClientMessage::JoinProject { project_id } => {
            match ProjectRepo::find_for_user(pool, project_id, user_id).await {
                Ok(Some(_)) => {
                    ws_manager.join_project(conn_id, project_id).await;
                    tracing::debug!(conn_id, project_id, "Joined project room");
                    ServerMessage::Joined { project_id }
                }
                Ok(None) => ServerMessage::error("Project not found"),
                Err(e) => {
                    tracing::error!(conn_id, project_id, error = %e, "Project lookup failed");
                    ServerMessage::error("Could not join project")
                }
            }
        }
        ClientMessage::LeaveProject { project_id } => {
            ws_manager.leave_project(conn_id, project_id).await;
            ServerMessage::Left { project_id }
        }
    }
}
