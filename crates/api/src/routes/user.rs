use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// GET    /profile    -> get_profile
/// PUT    /profile    -> update_profile
/// GET    /credits    -> credits
/// GET    /usage      -> usage
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(user::get_profile).put(user::update_profile))
        .route("/credits", get(user::credits))
        .route("/usage", get(user::usage))
}
