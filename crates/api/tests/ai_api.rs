//! Integration tests for the synchronous `/ai` helpers.

mod common;

use axum::http::StatusCode;
use common::{balance, body_json, post_json_auth, register, FakeModel, TestApp, BUNDLE_REPLY};
use lasy_db::repositories::LedgerRepo;
use lasy_providers::ai::Part;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn generate_idea_returns_model_text_and_charges(pool: PgPool) {
    let app = TestApp::with_model(pool, FakeModel::replying("A cozy bakery site."));
    let (token, _) = register(&app, "idea@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/generate-idea",
        json!({ "prompt": "bakery" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["idea"], "A cozy bakery site.");
    assert_eq!(balance(&app, &token).await, 98);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn generate_code_extracts_the_bundle(pool: PgPool) {
    let app = TestApp::new(pool);
    let (token, _) = register(&app, "code@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/generate-code",
        json!({ "prompt": "a bakery page", "context": { "theme": "dark" } }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let code = body_json(response).await["data"]["code"].clone();
    let expected: serde_json::Value = serde_json::from_str(BUNDLE_REPLY).unwrap();
    assert_eq!(code, expected);
    assert!(app.model.requests.lock().unwrap()[0].system.contains("dark"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unusable_code_reply_yields_the_fallback(pool: PgPool) {
    let app = TestApp::with_model(pool, FakeModel::replying("I'd rather not."));
    let (token, _) = register(&app, "fallback@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/generate-code",
        json!({ "prompt": "a bakery page" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_json(response).await["data"]["code"]["html"].clone();
    assert!(html.as_str().unwrap().contains("Code generation failed"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn edit_component_accepts_camel_case_and_costs_more(pool: PgPool) {
    let app = TestApp::with_model(pool, FakeModel::replying("<button class=\"big\">Buy</button>"));
    let (token, _) = register(&app, "edit@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/edit-component",
        json!({ "componentCode": "<button>Buy</button>", "instruction": "make it big" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["code"],
        "<button class=\"big\">Buy</button>"
    );
    assert_eq!(balance(&app, &token).await, 95);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn analyze_image_inlines_data_urls(pool: PgPool) {
    let app = TestApp::with_model(
        pool,
        FakeModel::replying("```json\n{\"colors\": [\"#ffffff\"]}\n```"),
    );
    let (token, _) = register(&app, "image@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/analyze-image",
        json!({ "imageUrl": "data:image/png;base64,iVBORw0KGgo=" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["analysis"],
        json!({ "colors": ["#ffffff"] })
    );

    let requests = app.model.requests.lock().unwrap();
    assert!(requests[0].parts.contains(&Part::InlineImage {
        mime_type: "image/png".to_string(),
        data: "iVBORw0KGgo=".to_string(),
    }));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_image_url_is_rejected_without_charge(pool: PgPool) {
    let app = TestApp::new(pool);
    let (token, _) = register(&app, "badurl@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/analyze-image",
        json!({ "image_url": "not a url" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(balance(&app, &token).await, 100);
    assert_eq!(app.model.request_count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn provider_failure_is_502_and_the_charge_stands(pool: PgPool) {
    let app = TestApp::with_model(pool, FakeModel::failing());
    let (token, _) = register(&app, "outage@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/generate-idea",
        json!({ "prompt": "bakery" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "PROVIDER_ERROR");
    assert_eq!(balance(&app, &token).await, 98);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn insufficient_credits_never_reach_the_model(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (token, user_id) = register(&app, "empty@example.com").await;
    LedgerRepo::debit(&pool, user_id, 97, "Spent elsewhere")
        .await
        .unwrap();

    let response = post_json_auth(
        app.router(),
        "/api/v1/ai/edit-component",
        json!({ "component_code": "<p>x</p>", "instruction": "bold" }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(balance(&app, &token).await, 3);
    assert_eq!(app.model.request_count(), 0);
}
