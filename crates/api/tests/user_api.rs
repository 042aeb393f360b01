//! Integration tests for profile, balance and usage endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_project, get_auth, post_json_auth, put_json_auth, register, TestApp};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn profile_update_changes_name_and_avatar(pool: PgPool) {
    let app = TestApp::new(pool);
    let (token, _) = register(&app, "profile@example.com").await;

    let response = put_json_auth(
        app.router(),
        "/api/v1/user/profile",
        json!({ "name": "  Ana Clara ", "avatar": "https://cdn.example.com/ana.png" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app.router(), "/api/v1/user/profile", &token).await;
    let user = body_json(response).await["data"].clone();
    assert_eq!(user["name"], "Ana Clara");
    assert_eq!(user["avatar_url"], "https://cdn.example.com/ana.png");
    assert_eq!(user["email"], "profile@example.com");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn profile_update_with_bad_avatar_is_400(pool: PgPool) {
    let app = TestApp::new(pool);
    let (token, _) = register(&app, "avatar@example.com").await;

    let response = put_json_auth(
        app.router(),
        "/api/v1/user/profile",
        json!({ "avatar_url": "not a url" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn credits_report_balance_and_plan(pool: PgPool) {
    let app = TestApp::new(pool);
    let (token, _) = register(&app, "credits@example.com").await;

    let response = get_auth(app.router(), "/api/v1/user/credits", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"],
        json!({ "credits": 100, "plan": null })
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn usage_lists_only_debits(pool: PgPool) {
    let app = TestApp::new(pool);
    let (token, _) = register(&app, "usage@example.com").await;
    create_project(&app, &token).await;
    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/generate-idea",
        json!({ "prompt": "bakery" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app.router(), "/api/v1/user/usage", &token).await;
    let usage = body_json(response).await["data"].clone();

    assert_eq!(usage["total_used"], 4);
    let entries = usage["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["kind"] == "usage"));
    // Newest first.
    assert_eq!(entries[0]["description"], "App idea generation");
    assert_eq!(entries[0]["balance_after"], 96);
}
