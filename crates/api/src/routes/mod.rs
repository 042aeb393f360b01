pub mod ai;
pub mod auth;
pub mod health;
pub mod payment;
pub mod project;
pub mod user;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket (?token=<jwt>)
///
/// /auth/register                        register (public)
/// /auth/login                           login (public)
/// /auth/me                              current user
/// /auth/logout                          logout
///
/// /projects                             list, create
/// /projects/{id}                        get, update, delete
/// /projects/{id}/generate               regenerate code (202)
/// /projects/{id}/deploy                 deploy (202)
/// /projects/{id}/deployments            deployment history
///
/// /ai/generate-idea                     app idea
/// /ai/generate-code                     code bundle
/// /ai/edit-component                    edit snippet
/// /ai/analyze-image                     design analysis
///
/// /user/profile                         get, update
/// /user/credits                         balance
/// /user/usage                           usage history
///
/// /payments/plans                       plan catalogue (public)
/// /payments/create-checkout-session     checkout
/// /payments/transactions                ledger history
/// /payments/webhook                     signed webhook (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/ai", ai::router())
        .nest("/user", user::router())
        .nest("/payments", payment::router())
}
