//! Handlers for the `/payments` resource: plan catalogue, checkout,
//! ledger history and the signed payment webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use lasy_core::error::CoreError;
use lasy_core::plans::{find_plan, Plan, PLANS};
use lasy_core::types::DbId;
use lasy_core::webhook_signature::verify_signature;
use lasy_db::models::status::TransactionKind;
use lasy_db::models::transaction::CreditTransaction;
use lasy_db::repositories::{LedgerError, LedgerRepo, UserRepo};
use lasy_providers::stripe::{CheckoutParams, PaymentEvent, WebhookEvent};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::not_found;
use crate::middleware::auth::AuthUser;
use crate::query::DEFAULT_LIMIT;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying `t=<unix>,v1=<hex>`.
const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(alias = "priceId")]
    pub price_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/payments/plans
pub async fn plans() -> Json<DataResponse<&'static [Plan]>> {
    Json(DataResponse { data: PLANS })
}

/// POST /api/v1/payments/create-checkout-session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<Json<DataResponse<CheckoutResponse>>> {
    let plan_id = state
        .payments
        .config()
        .plan_for_price(&input.price_id)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown price: {}", input.price_id)))?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| not_found("User", auth.user_id))?;

    let success_url = format!("{}/dashboard?success=true", state.config.frontend_url);
    let cancel_url = format!("{}/settings?canceled=true", state.config.frontend_url);

    let session = state
        .payments
        .create_checkout_session(&CheckoutParams {
            price_id: &input.price_id,
            plan_id,
            user_id: user.id,
            customer_email: &user.email,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    Ok(Json(DataResponse {
        data: CheckoutResponse {
            session_id: session.id,
            url: session.url,
        },
    }))
}

/// GET /api/v1/payments/transactions
pub async fn transactions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<CreditTransaction>>>> {
    let entries = LedgerRepo::list_for_user(&state.pool, auth.user_id, None, DEFAULT_LIMIT).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/payments/webhook
///
/// Unauthenticated; trust comes from the signature over the raw body.
/// Replayed checkout events are absorbed by the ledger's external reference
/// check.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".into()))?;

    let secret = state
        .payments
        .config()
        .webhook_secret
        .as_deref()
        .unwrap_or_default();
    verify_signature(secret, signature, &body, chrono::Utc::now().timestamp()).map_err(|e| {
        tracing::warn!(error = %e, "Rejected payment webhook");
        AppError::BadRequest(format!("Webhook signature verification failed: {e}"))
    })?;

    let event = WebhookEvent::parse(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let payment = event
        .classify()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Payment webhook received"
    );

    match payment {
        PaymentEvent::CheckoutCompleted {
            session_id,
            user_id,
            plan_id,
        } => apply_checkout(&state, &session_id, user_id, &plan_id).await?,
        PaymentEvent::SubscriptionDeleted {
            subscription_id,
            user_id,
        } => {
            tracing::info!(%subscription_id, ?user_id, "Subscription cancelled");
            if let Some(user_id) = user_id {
                let mut conn = state.pool.acquire().await?;
                UserRepo::set_plan_in(&mut conn, user_id, None).await?;
            }
        }
        PaymentEvent::Other(event_type) => {
            tracing::debug!(%event_type, "Ignoring payment event");
        }
    }

    Ok(Json(DataResponse {
        data: WebhookAck { received: true },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Grant the plan's credits and record the tier, once per checkout session.
async fn apply_checkout(
    state: &AppState,
    session_id: &str,
    user_id: DbId,
    plan_id: &str,
) -> AppResult<()> {
    let plan = find_plan(plan_id).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!("Unknown plan: {plan_id}")))
    })?;

    let mut tx = state.pool.begin().await?;
    let credited = match LedgerRepo::credit_in(
        &mut tx,
        user_id,
        plan.credits,
        TransactionKind::Subscription,
        &format!("Subscription: {}", plan.name),
        Some(session_id),
    )
    .await
    {
        Ok(entry) => entry,
        Err(LedgerError::UserNotFound(_)) => {
            // Acknowledged, not retried.
            tracing::warn!(user_id, session_id, "Checkout completed for unknown user");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(entry) = credited {
        UserRepo::set_plan_in(&mut tx, user_id, Some(plan.id)).await?;
        tracing::info!(
            user_id,
            plan_id = plan.id,
            credits = plan.credits,
            balance_after = entry.balance_after,
            "Subscription credits granted"
        );
    }
    tx.commit().await?;
    Ok(())
}
