//! Credit-gated background jobs: code generation and site deployment.
//!
//! The API charges for a job and moves the project into its in-progress
//! state synchronously, then hands the rest to a [`Pipeline`]. Each job
//! calls its provider once, writes a terminal state and publishes a
//! [`ProjectEvent`](lasy_events::ProjectEvent).

pub mod deployment;
pub mod error;
pub mod executor;
pub mod generation;

use std::sync::Arc;
use std::time::Duration;

use lasy_core::bundle::CodeBundle;
use lasy_core::types::DbId;

pub use deployment::{DeploymentRunner, DEPLOYMENT_FAILED_MESSAGE};
pub use error::JobError;
pub use executor::{FailureHandler, JobExecutor, JobKey, JobKind, JobSlot};
pub use generation::{GenerationRunner, GENERATION_FAILED_MESSAGE};

/// The executor together with both job runners.
pub struct Pipeline {
    executor: JobExecutor,
    generation: Arc<GenerationRunner>,
    deployment: Arc<DeploymentRunner>,
}

impl Pipeline {
    pub fn new(
        executor: JobExecutor,
        generation: GenerationRunner,
        deployment: DeploymentRunner,
    ) -> Self {
        Self {
            executor,
            generation: Arc::new(generation),
            deployment: Arc::new(deployment),
        }
    }

    pub fn executor(&self) -> &JobExecutor {
        &self.executor
    }

    /// Provider name to record on new deployment rows.
    pub fn deploy_provider(&self) -> &'static str {
        self.deployment.provider_name()
    }

    /// See [`JobExecutor::try_claim`].
    pub fn try_claim(&self, kind: JobKind, project_id: DbId) -> Option<JobSlot> {
        self.executor.try_claim(kind, project_id)
    }

    /// Run a generation job for a project already marked `generating`.
    pub fn spawn_generation(
        &self,
        slot: JobSlot,
        project_id: DbId,
        prompt: String,
        prior: Option<CodeBundle>,
    ) {
        debug_assert_eq!(slot.key().kind, JobKind::Generation);
        let runner = Arc::clone(&self.generation);
        self.executor.dispatch(slot, async move {
            runner.run(project_id, &prompt, prior.as_ref()).await.map(drop)
        });
    }

    /// Run a deployment job for a deployment row already marked `deploying`.
    pub fn spawn_deployment(
        &self,
        slot: JobSlot,
        deployment_id: DbId,
        project_id: DbId,
        bundle: CodeBundle,
    ) {
        debug_assert_eq!(slot.key().kind, JobKind::Deployment);
        let runner = Arc::clone(&self.deployment);
        self.executor.dispatch(slot, async move {
            runner.run(deployment_id, project_id, &bundle).await.map(drop)
        });
    }

    /// See [`JobExecutor::shutdown`].
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.executor.shutdown(timeout).await
    }
}
