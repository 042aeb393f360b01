//! Handlers for the `/user` resource (profile, balance, usage).

use axum::extract::State;
use axum::Json;
use lasy_db::models::status::TransactionKind;
use lasy_db::models::transaction::CreditTransaction;
use lasy_db::models::user::{UpdateProfile, User};
use lasy_db::repositories::{LedgerRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::{not_found, validate_input};
use crate::middleware::auth::AuthUser;
use crate::query::DEFAULT_LIMIT;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub name: Option<String>,
    #[serde(alias = "avatar")]
    #[validate(url(message = "must be a valid URL"))]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i32,
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Credits spent over the user's whole history.
    pub total_used: i64,
    pub transactions: Vec<CreditTransaction>,
}

/// GET /api/v1/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<User>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| not_found("User", auth.user_id))?;
    Ok(Json(DataResponse { data: user }))
}

/// PUT /api/v1/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<User>>> {
    validate_input(&input)?;
    let update = UpdateProfile {
        name: input.name.map(|name| name.trim().to_string()),
        avatar_url: input.avatar_url,
    };
    let user = UserRepo::update_profile(&state.pool, auth.user_id, &update)
        .await?
        .ok_or_else(|| not_found("User", auth.user_id))?;
    Ok(Json(DataResponse { data: user }))
}

/// GET /api/v1/user/credits
pub async fn credits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<CreditsResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| not_found("User", auth.user_id))?;
    Ok(Json(DataResponse {
        data: CreditsResponse {
            credits: user.credits,
            plan: user.plan,
        },
    }))
}

/// GET /api/v1/user/usage
pub async fn usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UsageResponse>>> {
    let transactions = LedgerRepo::list_for_user(
        &state.pool,
        auth.user_id,
        Some(TransactionKind::Usage),
        DEFAULT_LIMIT,
    )
    .await?;
    // Usage amounts are negative.
    let total_used =
        -LedgerRepo::sum_for_user(&state.pool, auth.user_id, Some(TransactionKind::Usage)).await?;

    Ok(Json(DataResponse {
        data: UsageResponse {
            total_used,
            transactions,
        },
    }))
}
