//! Repository for the `projects` table.
//!
//! Every user-facing lookup is scoped by `user_id`, so a project owned by
//! someone else is indistinguishable from a missing one.

use lasy_core::bundle::CodeBundle;
use lasy_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::status::ProjectStatus;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, name, description, prompt, code, status_id, created_at, updated_at";

/// Provides CRUD and lifecycle operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in the given status, returning the created row.
    pub async fn create_in(
        conn: &mut PgConnection,
        user_id: DbId,
        input: &CreateProject,
        status: ProjectStatus,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, name, description, prompt, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.prompt)
            .bind(status.id())
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a project by ID regardless of owner. Used by background jobs.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project owned by `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's projects, most recently updated first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE user_id = $1 ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the project does not exist or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 code = COALESCE($5, code) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.code.clone().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Delete a project (deployments cascade). Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a project to `status`. Returns `true` if the row exists.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<bool, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::set_status_in(&mut conn, id, status).await
    }

    /// [`set_status`](Self::set_status) on an open connection.
    pub async fn set_status_in(
        conn: &mut PgConnection,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE projects SET status_id = $2 WHERE id = $1")
            .bind(id)
            .bind(status.id())
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store a freshly generated bundle and mark the project ready.
    ///
    /// Returns `None` if the project was deleted while the job ran.
    pub async fn complete_generation(
        pool: &PgPool,
        id: DbId,
        bundle: &CodeBundle,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET code = $2, status_id = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(Json(bundle))
            .bind(ProjectStatus::Ready.id())
            .fetch_optional(pool)
            .await
    }
}
