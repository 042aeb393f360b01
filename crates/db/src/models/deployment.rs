//! Deployment entity model.

use lasy_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::{DeploymentStatus, StatusId};

/// A row from the `deployments` table.
///
/// `url` and `external_id` are only set on success, `error` only on failure.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deployment {
    pub id: DbId,
    pub project_id: DbId,
    #[serde(rename = "status", serialize_with = "DeploymentStatus::serialize_id")]
    pub status_id: StatusId,
    pub provider: String,
    pub url: Option<String>,
    pub external_id: Option<String>,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Deployment {
    pub fn status(&self) -> Option<DeploymentStatus> {
        DeploymentStatus::from_id(self.status_id)
    }
}
