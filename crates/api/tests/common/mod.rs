//! Shared helpers for API integration tests.
//!
//! Builds the full application router (same middleware stack as production)
//! with fake model and deployer implementations, plus request helpers in
//! the style of `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use lasy_api::auth::jwt::JwtConfig;
use lasy_api::config::ServerConfig;
use lasy_api::notifications::PushRouter;
use lasy_api::router::build_app_router;
use lasy_api::state::AppState;
use lasy_api::ws::WsManager;
use lasy_core::credits::CreditCosts;
use lasy_core::plans::PLAN_PRO;
use lasy_core::site::SiteFile;
use lasy_events::{EventBus, Notifier};
use lasy_pipeline::{DeploymentRunner, GenerationRunner, JobExecutor, Pipeline};
use lasy_providers::ai::{CompletionRequest, TextModel};
use lasy_providers::deploy::{DeployedSite, SiteDeployer};
use lasy_providers::stripe::{StripeClient, StripeConfig};
use lasy_providers::ProviderError;
use sqlx::PgPool;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const PRO_PRICE: &str = "price_pro";

/// A well-formed bundle reply from the fake model.
pub const BUNDLE_REPLY: &str =
    r#"{"html":"<h1>Bakery</h1>","css":"h1{color:brown}","javascript":"console.log('hi')"}"#;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Text model with a canned reply (or failure) that records requests.
pub struct FakeModel {
    reply: Option<String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            requests: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::default(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextModel for FakeModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().ok_or_else(|| ProviderError::Api {
            provider: "fake",
            status: 503,
            body: "model unavailable".to_string(),
        })
    }
}

/// Deployer that always succeeds at `https://<name>.fake.app`.
#[derive(Default)]
pub struct FakeDeployer {
    pub uploads: Mutex<Vec<(String, Vec<SiteFile>)>>,
}

#[async_trait]
impl SiteDeployer for FakeDeployer {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn deploy(&self, name: &str, files: &[SiteFile]) -> Result<DeployedSite, ProviderError> {
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), files.to_vec()));
        Ok(DeployedSite {
            url: format!("https://{name}.fake.app"),
            external_id: format!("dpl_{name}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with sensible defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        frontend_url: "http://localhost:5173".to_string(),
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        credits: CreditCosts::default(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            expiry_mins: 60,
        },
    }
}

/// Application under test plus handles on its fakes.
pub struct TestApp {
    pub state: AppState,
    pub bus: Arc<EventBus>,
    pub model: Arc<FakeModel>,
    pub deployer: Arc<FakeDeployer>,
    router: Router,
}

impl TestApp {
    /// App whose model answers with [`BUNDLE_REPLY`].
    pub fn new(pool: PgPool) -> Self {
        Self::with_model(pool, FakeModel::replying(BUNDLE_REPLY))
    }

    pub fn with_model(pool: PgPool, model: FakeModel) -> Self {
        Self::build(pool, model, "http://127.0.0.1:9".to_string())
    }

    /// App whose payment client talks to `stripe_url`.
    pub fn with_stripe(pool: PgPool, stripe_url: String) -> Self {
        Self::build(pool, FakeModel::replying(BUNDLE_REPLY), stripe_url)
    }

    fn build(pool: PgPool, model: FakeModel, stripe_url: String) -> Self {
        let config = test_config();
        let ws_manager = Arc::new(WsManager::new());

        let bus = Arc::new(EventBus::default());
        tokio::spawn(PushRouter::new(Arc::clone(&ws_manager)).run(bus.subscribe()));
        let notifier: Arc<dyn Notifier> = bus.clone();

        let model = Arc::new(model);
        let deployer = Arc::new(FakeDeployer::default());
        let pipeline = Pipeline::new(
            JobExecutor::logging(),
            GenerationRunner::new(pool.clone(), model.clone(), Arc::clone(&notifier)),
            DeploymentRunner::new(pool.clone(), deployer.clone(), notifier),
        );

        let payments = StripeClient::new(StripeConfig {
            secret_key: Some("sk_test".to_string()),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            api_url: stripe_url,
            prices: vec![(PRO_PRICE.to_string(), PLAN_PRO)],
            timeout: Duration::from_secs(5),
        });

        let state = AppState {
            pool,
            config: Arc::new(config.clone()),
            ws_manager,
            pipeline: Arc::new(pipeline),
            model: model.clone(),
            payments: Arc::new(payments),
        };
        let router = build_app_router(state.clone(), &config);

        Self {
            state,
            bus,
            model,
            deployer,
            router,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Wait until no background job holds a slot.
    pub async fn wait_for_jobs(&self) {
        let executor = self.state.pipeline.executor();
        for _ in 0..200 {
            if executor.in_flight_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("background jobs did not finish in time");
    }
}

/// Serve the app on an ephemeral port and return its address.
pub async fn serve(router: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Read the full response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

/// Send a GET request with a Bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(json)).await
}

/// Send a POST request with a JSON body and a Bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(json)).await
}

/// Send a PUT request with a JSON body and a Bearer token.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(json)).await
}

/// Send a DELETE request with a Bearer token.
pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Register a user through the API. Returns `(token, user_id)`.
pub async fn register(app: &TestApp, email: &str) -> (String, i64) {
    let response = post_json(
        app.router(),
        "/api/v1/auth/register",
        serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": "hunter22",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let token = json["data"]["token"].as_str().unwrap().to_string();
    let user_id = json["data"]["user"]["id"].as_i64().unwrap();
    (token, user_id)
}

/// Create a project through the API and wait for its first generation.
pub async fn create_project(app: &TestApp, token: &str) -> serde_json::Value {
    let response = post_json_auth(
        app.router(),
        "/api/v1/projects",
        serde_json::json!({
            "name": "Bakery",
            "prompt": "A landing page for a bakery",
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    app.wait_for_jobs().await;
    json["data"].clone()
}

/// Current balance as reported by `/user/credits`.
pub async fn balance(app: &TestApp, token: &str) -> i64 {
    let response = get_auth(app.router(), "/api/v1/user/credits", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["credits"].as_i64().unwrap()
}
