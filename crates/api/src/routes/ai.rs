use axum::routing::post;
use axum::Router;

use crate::handlers::ai;
use crate::state::AppState;

/// Routes mounted at `/ai`. All require authentication and are charged.
///
/// ```text
/// POST   /generate-idea     -> generate_idea
/// POST   /generate-code     -> generate_code
/// POST   /edit-component    -> edit_component
/// POST   /analyze-image     -> analyze_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-idea", post(ai::generate_idea))
        .route("/generate-code", post(ai::generate_code))
        .route("/edit-component", post(ai::edit_component))
        .route("/analyze-image", post(ai::analyze_image))
}
