//! Route definitions for `/payments`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// GET    /plans                       -> plans (public)
/// POST   /create-checkout-session     -> create_checkout_session
/// GET    /transactions                -> transactions
/// POST   /webhook                     -> webhook (public, signed)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(payment::plans))
        .route(
            "/create-checkout-session",
            post(payment::create_checkout_session),
        )
        .route("/transactions", get(payment::transactions))
        .route("/webhook", post(payment::webhook))
}
