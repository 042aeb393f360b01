//! Project entity model and DTOs.

use lasy_core::bundle::CodeBundle;
use lasy_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::status::{ProjectStatus, StatusId};

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
    pub code: Option<Json<CodeBundle>>,
    #[serde(rename = "status", serialize_with = "ProjectStatus::serialize_id")]
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn status(&self) -> Option<ProjectStatus> {
        ProjectStatus::from_id(self.status_id)
    }

    /// The stored bundle, if any.
    pub fn bundle(&self) -> Option<&CodeBundle> {
        self.code.as_ref().map(|json| &json.0)
    }

    /// `true` when there is something worth deploying.
    pub fn has_deployable_code(&self) -> bool {
        self.bundle().is_some_and(|bundle| !bundle.is_empty())
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<CodeBundle>,
}
