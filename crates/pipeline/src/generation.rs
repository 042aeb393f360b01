//! Code generation job.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use lasy_core::bundle::{extract_bundle, CodeBundle};
use lasy_core::types::DbId;
use lasy_db::models::status::ProjectStatus;
use lasy_db::repositories::ProjectRepo;
use lasy_events::{Notifier, ProjectEvent};
use lasy_providers::ai::{prompts, TextModel};
use sqlx::PgPool;

use crate::error::JobError;
use crate::executor::panic_message;

/// Message pushed to clients when generation fails. Provider and database
/// details stay in the logs.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate code";

/// Moves a project from `generating` to `ready` or `failed`.
pub struct GenerationRunner {
    pool: PgPool,
    model: Arc<dyn TextModel>,
    notifier: Arc<dyn Notifier>,
}

impl GenerationRunner {
    pub fn new(pool: PgPool, model: Arc<dyn TextModel>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            model,
            notifier,
        }
    }

    /// Generate code for `prompt` and store it on the project.
    ///
    /// `prior` is the project's current bundle; when present it is sent as
    /// context so the model edits instead of starting over. A reply without
    /// an extractable bundle stores [`CodeBundle::fallback`].
    ///
    /// Any failure, a panic included, marks the project failed, keeps its
    /// previous code and publishes `code-generation-failed`.
    pub async fn run(
        &self,
        project_id: DbId,
        prompt: &str,
        prior: Option<&CodeBundle>,
    ) -> Result<CodeBundle, JobError> {
        let outcome = AssertUnwindSafe(self.generate(project_id, prompt, prior))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload))));

        match outcome {
            Ok(bundle) => {
                tracing::info!(project_id, "Code generated");
                self.notifier.notify(ProjectEvent::CodeGenerated {
                    project_id,
                    code: bundle.clone(),
                });
                Ok(bundle)
            }
            Err(err) => {
                self.fail(project_id, &err).await;
                Err(err)
            }
        }
    }

    async fn generate(
        &self,
        project_id: DbId,
        prompt: &str,
        prior: Option<&CodeBundle>,
    ) -> Result<CodeBundle, JobError> {
        let context = prior
            .filter(|bundle| !bundle.is_empty())
            .and_then(|bundle| serde_json::to_value(bundle).ok());
        let request = prompts::code_generation(prompt, context.as_ref());

        tracing::info!(project_id, has_context = context.is_some(), "Generating code");

        let reply = self.model.complete(request).await?;

        let bundle = extract_bundle(&reply).unwrap_or_else(|e| {
            tracing::warn!(project_id, error = %e, "Storing fallback bundle");
            CodeBundle::fallback()
        });

        ProjectRepo::complete_generation(&self.pool, project_id, &bundle)
            .await?
            .ok_or(JobError::ProjectGone(project_id))?;
        Ok(bundle)
    }

    /// Best-effort terminal state for a failed run.
    async fn fail(&self, project_id: DbId, err: &JobError) {
        tracing::error!(project_id, error = %err, "Code generation failed");
        if let Err(e) = ProjectRepo::set_status(&self.pool, project_id, ProjectStatus::Failed).await
        {
            tracing::error!(project_id, error = %e, "Could not mark project failed");
        }
        self.notifier.notify(ProjectEvent::CodeGenerationFailed {
            project_id,
            error: GENERATION_FAILED_MESSAGE.to_string(),
        });
    }
}
