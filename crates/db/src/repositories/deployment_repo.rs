//! Repository for the `deployments` table.

use lasy_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::deployment::Deployment;
use crate::models::status::{DeploymentStatus, ProjectStatus};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, status_id, provider, url, external_id, error, \
                       created_at, updated_at";

/// Provides lifecycle operations for deployments.
pub struct DeploymentRepo;

impl DeploymentRepo {
    /// Insert a deployment row for `project_id` in the given status.
    pub async fn create_in(
        conn: &mut PgConnection,
        project_id: DbId,
        provider: &str,
        status: DeploymentStatus,
    ) -> Result<Deployment, sqlx::Error> {
        let query = format!(
            "INSERT INTO deployments (project_id, provider, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(project_id)
            .bind(provider)
            .bind(status.id())
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a deployment by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deployments WHERE id = $1");
        sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deployment history for a project, newest first.
    ///
    /// `limit` of `None` returns the whole history.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<Deployment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deployments \
             WHERE project_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(project_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Record a successful upload and mark the parent project deployed.
    ///
    /// Both rows change in one transaction. Returns `None` if the deployment
    /// no longer exists (its project was deleted mid-flight).
    pub async fn mark_success(
        pool: &PgPool,
        id: DbId,
        url: &str,
        external_id: &str,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE deployments SET status_id = $2, url = $3, external_id = $4, error = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let deployment = sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .bind(DeploymentStatus::Success.id())
            .bind(url)
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(deployment) = &deployment {
            sqlx::query("UPDATE projects SET status_id = $2 WHERE id = $1")
                .bind(deployment.project_id)
                .bind(ProjectStatus::Deployed.id())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(deployment)
    }

    /// Record a failed upload. The parent project is left untouched.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!(
            "UPDATE deployments SET status_id = $2, error = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .bind(DeploymentStatus::Failed.id())
            .bind(error)
            .fetch_optional(pool)
            .await
    }
}
