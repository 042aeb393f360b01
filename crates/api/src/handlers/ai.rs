//! Handlers for the synchronous `/ai` helpers.
//!
//! Each call is charged before the model is contacted; a provider failure
//! surfaces as `502 PROVIDER_ERROR` and the charge stands.

use axum::extract::State;
use axum::Json;
use lasy_core::bundle::{extract_bundle, CodeBundle};
use lasy_core::credits::{
    DESC_ANALYZE_IMAGE, DESC_EDIT_COMPONENT, DESC_GENERATE_CODE, DESC_GENERATE_IDEA,
};
use lasy_providers::ai::{image_part_from_url, parse_analysis, prompts};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::{charge, validate_input};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct IdeaRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub prompt: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CodeRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub prompt: String,
    /// Arbitrary JSON the model should build on.
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditComponentRequest {
    #[serde(alias = "componentCode")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub component_code: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub instruction: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeImageRequest {
    #[serde(alias = "imageUrl")]
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct IdeaResponse {
    pub idea: String,
}

#[derive(Debug, Serialize)]
pub struct BundleResponse {
    pub code: CodeBundle,
}

#[derive(Debug, Serialize)]
pub struct EditedComponent {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/ai/generate-idea
pub async fn generate_idea(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<IdeaRequest>,
) -> AppResult<Json<DataResponse<IdeaResponse>>> {
    validate_input(&input)?;
    pay(&state, &auth, state.config.credits.ai_call, DESC_GENERATE_IDEA).await?;

    let idea = state.model.complete(prompts::app_idea(&input.prompt)).await?;
    Ok(Json(DataResponse {
        data: IdeaResponse { idea },
    }))
}

/// POST /api/v1/ai/generate-code
///
/// Same extraction rules as the generation job; an unusable reply yields
/// the fallback bundle.
pub async fn generate_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CodeRequest>,
) -> AppResult<Json<DataResponse<BundleResponse>>> {
    validate_input(&input)?;
    pay(&state, &auth, state.config.credits.ai_call, DESC_GENERATE_CODE).await?;

    let request = prompts::code_generation(&input.prompt, input.context.as_ref());
    let reply = state.model.complete(request).await?;
    let code = extract_bundle(&reply).unwrap_or_else(|e| {
        tracing::warn!(user_id = auth.user_id, error = %e, "Returning fallback bundle");
        CodeBundle::fallback()
    });

    Ok(Json(DataResponse {
        data: BundleResponse { code },
    }))
}

/// POST /api/v1/ai/edit-component
pub async fn edit_component(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<EditComponentRequest>,
) -> AppResult<Json<DataResponse<EditedComponent>>> {
    validate_input(&input)?;
    pay(
        &state,
        &auth,
        state.config.credits.edit_component,
        DESC_EDIT_COMPONENT,
    )
    .await?;

    let request = prompts::edit_component(&input.component_code, &input.instruction);
    let code = state.model.complete(request).await?;
    Ok(Json(DataResponse {
        data: EditedComponent { code },
    }))
}

/// POST /api/v1/ai/analyze-image
pub async fn analyze_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<AnalyzeImageRequest>,
) -> AppResult<Json<DataResponse<AnalysisResponse>>> {
    validate_input(&input)?;
    pay(&state, &auth, state.config.credits.ai_call, DESC_ANALYZE_IMAGE).await?;

    let request = prompts::image_analysis(image_part_from_url(&input.image_url));
    let reply = state.model.complete(request).await?;
    Ok(Json(DataResponse {
        data: AnalysisResponse {
            analysis: parse_analysis(&reply),
        },
    }))
}

/// Charge for a synchronous call in its own transaction.
async fn pay(state: &AppState, auth: &AuthUser, cost: i32, description: &str) -> AppResult<()> {
    let mut tx = state.pool.begin().await?;
    charge(&mut tx, auth.user_id, cost, description).await?;
    tx.commit().await?;
    tracing::debug!(user_id = auth.user_id, cost, description, "AI call charged");
    Ok(())
}
