//! Handlers for the `/projects` resource, including the credit-gated
//! generation and deployment triggers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use lasy_core::bundle::CodeBundle;
use lasy_core::credits::{DESC_PROJECT_CREATE, DESC_PROJECT_DEPLOY, DESC_PROJECT_GENERATE};
use lasy_core::error::CoreError;
use lasy_core::types::DbId;
use lasy_db::models::deployment::Deployment;
use lasy_db::models::project::{CreateProject, Project, UpdateProject};
use lasy_db::models::status::{DeploymentStatus, ProjectStatus};
use lasy_db::repositories::{DeploymentRepo, ProjectRepo};
use lasy_pipeline::{JobKind, JobSlot};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::{charge, not_found, validate_input};
use crate::middleware::auth::AuthUser;
use crate::query::{LimitParams, DEFAULT_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

/// Deployments embedded in a project detail response.
const RECENT_DEPLOYMENTS: i64 = 5;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub prompt: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<CodeBundle>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub prompt: String,
}

/// Project detail with its most recent deployments.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub deployments: Vec<Deployment>,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
///
/// Charges one AI call, stores the project as `generating` and starts the
/// first generation in the background.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    validate_input(&input)?;

    let mut tx = state.pool.begin().await?;
    charge(
        &mut tx,
        auth.user_id,
        state.config.credits.ai_call,
        DESC_PROJECT_CREATE,
    )
    .await?;
    let mut project = ProjectRepo::create_in(
        &mut tx,
        auth.user_id,
        &CreateProject {
            name: input.name,
            description: input.description,
            prompt: input.prompt,
        },
        ProjectStatus::Generating,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(project_id = project.id, user_id = auth.user_id, "Project created");

    match state.pipeline.try_claim(JobKind::Generation, project.id) {
        Some(slot) => {
            state
                .pipeline
                .spawn_generation(slot, project.id, project.prompt.clone(), None);
        }
        None => {
            // Nothing will run for this project, so it must not stay `generating`.
            tracing::warn!(
                project_id = project.id,
                "Generation slot already held for new project"
            );
            ProjectRepo::set_status(&state.pool, project.id, ProjectStatus::Failed).await?;
            project.status_id = ProjectStatus::Failed.id();
        }
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let project = find_owned(&state, id, auth.user_id).await?;
    let deployments =
        DeploymentRepo::list_for_project(&state.pool, id, Some(RECENT_DEPLOYMENTS)).await?;
    Ok(Json(DataResponse {
        data: ProjectDetail {
            project,
            deployments,
        },
    }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    validate_input(&input)?;

    let update = UpdateProject {
        name: input.name,
        description: input.description,
        code: input.code,
    };
    let project = ProjectRepo::update(&state.pool, id, auth.user_id, &update)
        .await?
        .ok_or_else(|| not_found("Project", id))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ProjectRepo::delete(&state.pool, id, auth.user_id).await? {
        tracing::info!(project_id = id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Project", id))
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/generate
///
/// Regenerate the project's code from a new prompt. The current bundle is
/// sent along as context. Returns 202 with the project in `generating`.
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    validate_input(&input)?;
    let mut project = find_owned(&state, id, auth.user_id).await?;
    let slot = claim(&state, JobKind::Generation, id, "Code generation already in progress")?;

    let mut tx = state.pool.begin().await?;
    charge(
        &mut tx,
        auth.user_id,
        state.config.credits.ai_call,
        DESC_PROJECT_GENERATE,
    )
    .await?;
    if !ProjectRepo::set_status_in(&mut tx, id, ProjectStatus::Generating).await? {
        return Err(not_found("Project", id));
    }
    tx.commit().await?;

    project.status_id = ProjectStatus::Generating.id();
    let prior = project.bundle().cloned();
    tracing::info!(project_id = id, user_id = auth.user_id, "Regeneration requested");
    state.pipeline.spawn_generation(slot, id, input.prompt, prior);

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: project })))
}

/// POST /api/v1/projects/{id}/deploy
///
/// Requires stored code. Returns 202 with the new `deploying` deployment.
pub async fn deploy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Deployment>>)> {
    let project = find_owned(&state, id, auth.user_id).await?;
    let bundle = match project.bundle() {
        Some(bundle) if !bundle.is_empty() => bundle.clone(),
        _ => return Err(AppError::Core(CoreError::NoCodeToDeploy(id))),
    };
    let slot = claim(&state, JobKind::Deployment, id, "Deployment already in progress")?;

    let mut tx = state.pool.begin().await?;
    charge(
        &mut tx,
        auth.user_id,
        state.config.credits.deploy,
        DESC_PROJECT_DEPLOY,
    )
    .await?;
    let deployment = DeploymentRepo::create_in(
        &mut tx,
        id,
        state.pipeline.deploy_provider(),
        DeploymentStatus::Deploying,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(project_id = id, deployment_id = deployment.id, "Deployment requested");
    state
        .pipeline
        .spawn_deployment(slot, deployment.id, id, bundle);

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: deployment })))
}

/// GET /api/v1/projects/{id}/deployments
pub async fn list_deployments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<Deployment>>>> {
    find_owned(&state, id, auth.user_id).await?;
    let deployments =
        DeploymentRepo::list_for_project(&state.pool, id, Some(params.resolve(DEFAULT_LIMIT)))
            .await?;
    Ok(Json(DataResponse { data: deployments }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_owned(state: &AppState, id: DbId, user_id: DbId) -> AppResult<Project> {
    ProjectRepo::find_for_user(&state.pool, id, user_id)
        .await?
        .ok_or_else(|| not_found("Project", id))
}

/// Claim the single-flight slot before any credits move.
fn claim(state: &AppState, kind: JobKind, project_id: DbId, busy: &str) -> AppResult<JobSlot> {
    state
        .pipeline
        .try_claim(kind, project_id)
        .ok_or_else(|| AppError::Core(CoreError::Conflict(busy.to_string())))
}
