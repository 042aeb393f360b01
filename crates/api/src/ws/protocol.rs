//! JSON frames exchanged over the push socket.
//!
//! Clients send `{"type": "join-project", "projectId": 7}` and
//! `{"type": "leave-project", "projectId": 7}`; the server acknowledges
//! with `joined`, `left` or `error` frames. Project events themselves are
//! serialized [`ProjectEvent`](lasy_events::ProjectEvent)s.

use axum::extract::ws::Message;
use lasy_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Frame sent by a browser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinProject { project_id: DbId },
    #[serde(rename_all = "camelCase")]
    LeaveProject { project_id: DbId },
}

/// Acknowledgement sent back to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Joined { project_id: DbId },
    #[serde(rename_all = "camelCase")]
    Left { project_id: DbId },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Encode any serializable frame as a WebSocket text message.
pub fn text_frame<T: Serialize>(frame: &T) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(frame)?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_use_kebab_type_and_camel_fields() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"join-project","projectId":7}"#).unwrap();
        assert_eq!(join, ClientMessage::JoinProject { project_id: 7 });

        let leave: ClientMessage =
            serde_json::from_str(r#"{"type":"leave-project","projectId":7}"#).unwrap();
        assert_eq!(leave, ClientMessage::LeaveProject { project_id: 7 });
    }

    #[test]
    fn unknown_client_frame_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe-all"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join-project"}"#).is_err());
    }

    #[test]
    fn server_frames_shape() {
        let joined = serde_json::to_value(ServerMessage::Joined { project_id: 3 }).unwrap();
        assert_eq!(joined, serde_json::json!({"type": "joined", "projectId": 3}));

        let error = serde_json::to_value(ServerMessage::error("nope")).unwrap();
        assert_eq!(error, serde_json::json!({"type": "error", "message": "nope"}));
    }
}
