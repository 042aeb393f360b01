//! Static-site deployment job.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use lasy_core::bundle::CodeBundle;
use lasy_core::site::{build_site_files, site_name};
use lasy_core::types::DbId;
use lasy_db::models::deployment::Deployment;
use lasy_db::repositories::DeploymentRepo;
use lasy_events::{Notifier, ProjectEvent};
use lasy_providers::deploy::SiteDeployer;
use sqlx::PgPool;

use crate::error::JobError;
use crate::executor::panic_message;

/// Recorded and pushed when a deployment fails for a reason other than the
/// provider rejecting it.
pub const DEPLOYMENT_FAILED_MESSAGE: &str = "Deployment failed";

/// Moves a deployment from `deploying` to `success` or `failed`.
pub struct DeploymentRunner {
    pool: PgPool,
    deployer: Arc<dyn SiteDeployer>,
    notifier: Arc<dyn Notifier>,
}

impl DeploymentRunner {
    pub fn new(pool: PgPool, deployer: Arc<dyn SiteDeployer>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            deployer,
            notifier,
        }
    }

    /// Name recorded on deployment rows created for this runner.
    pub fn provider_name(&self) -> &'static str {
        self.deployer.provider_name()
    }

    /// Publish `bundle` as the project's site.
    ///
    /// On success the deployment gets its URL and the project becomes
    /// `deployed`. On any failure, a panic included, only the deployment
    /// row changes and `deployment-failed` is published.
    pub async fn run(
        &self,
        deployment_id: DbId,
        project_id: DbId,
        bundle: &CodeBundle,
    ) -> Result<Deployment, JobError> {
        let outcome = AssertUnwindSafe(self.deploy(deployment_id, project_id, bundle))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload))));

        match outcome {
            Ok(deployment) => {
                let url = deployment.url.clone().unwrap_or_default();
                tracing::info!(project_id, deployment_id, url = %url, "Site deployed");
                self.notifier
                    .notify(ProjectEvent::DeploymentSuccess { project_id, url });
                Ok(deployment)
            }
            Err(err) => {
                self.fail(deployment_id, project_id, &err).await;
                Err(err)
            }
        }
    }

    async fn deploy(
        &self,
        deployment_id: DbId,
        project_id: DbId,
        bundle: &CodeBundle,
    ) -> Result<Deployment, JobError> {
        let name = site_name(project_id);
        let files = build_site_files(bundle);

        tracing::info!(project_id, deployment_id, site = %name, "Deploying site");

        let site = self.deployer.deploy(&name, &files).await?;
        DeploymentRepo::mark_success(&self.pool, deployment_id, &site.url, &site.external_id)
            .await?
            .ok_or(JobError::DeploymentGone(deployment_id))
    }

    /// Best-effort terminal state for a failed run.
    async fn fail(&self, deployment_id: DbId, project_id: DbId, err: &JobError) {
        tracing::error!(project_id, deployment_id, error = %err, "Deployment failed");
        let message = match err {
            JobError::Provider(e) => e.to_string(),
            _ => DEPLOYMENT_FAILED_MESSAGE.to_string(),
        };
        if let Err(e) = DeploymentRepo::mark_failed(&self.pool, deployment_id, &message).await {
            tracing::error!(deployment_id, error = %e, "Could not mark deployment failed");
        }
        self.notifier.notify(ProjectEvent::DeploymentFailed {
            project_id,
            error: message,
        });
    }
}
