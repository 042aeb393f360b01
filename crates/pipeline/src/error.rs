use lasy_core::types::DbId;
use lasy_providers::ProviderError;

/// Why a background job did not reach its success state.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The project was deleted while the job ran.
    #[error("project {0} no longer exists")]
    ProjectGone(DbId),

    /// The deployment row was deleted (with its project) while the job ran.
    #[error("deployment {0} no longer exists")]
    DeploymentGone(DbId),

    #[error("job panicked: {0}")]
    Panicked(String),
}
