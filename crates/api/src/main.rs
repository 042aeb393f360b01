use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lasy_api::config::ServerConfig;
use lasy_api::notifications::PushRouter;
use lasy_api::router::build_app_router;
use lasy_api::state::AppState;
use lasy_api::ws;
use lasy_events::{EventBus, Notifier};
use lasy_pipeline::{DeploymentRunner, GenerationRunner, JobExecutor, Pipeline};
use lasy_providers::ai::TextModel;
use lasy_providers::deploy::{VercelClient, VercelConfig};
use lasy_providers::gemini::{GeminiClient, GeminiConfig};
use lasy_providers::stripe::{StripeClient, StripeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lasy_api=debug,lasy_pipeline=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = lasy_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    lasy_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    lasy_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let push_router = PushRouter::new(Arc::clone(&ws_manager));
    let push_handle = tokio::spawn(push_router.run(event_bus.subscribe()));
    tracing::info!("Event bus and push router started");

    // --- Providers ---
    let gemini = GeminiConfig::from_env();
    let vercel = VercelConfig::from_env();
    let stripe = StripeConfig::from_env();
    if gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, AI calls will fail");
    }
    if vercel.token.is_none() {
        tracing::warn!("VERCEL_TOKEN not set, deployments will fail");
    }
    if stripe.webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, payment webhooks will be rejected");
    }
    let model: Arc<dyn TextModel> = Arc::new(GeminiClient::new(gemini));
    let notifier: Arc<dyn Notifier> = event_bus.clone();

    // --- Job pipeline ---
    let pipeline = Arc::new(Pipeline::new(
        JobExecutor::logging(),
        GenerationRunner::new(pool.clone(), Arc::clone(&model), Arc::clone(&notifier)),
        DeploymentRunner::new(
            pool.clone(),
            Arc::new(VercelClient::new(vercel)),
            notifier,
        ),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        pipeline: Arc::clone(&pipeline),
        model,
        payments: Arc::new(StripeClient::new(stripe)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let in_flight = pipeline.executor().in_flight_count();
    tracing::info!(in_flight, "Waiting for background jobs");
    if pipeline
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await
    {
        tracing::info!("Background jobs finished");
    } else {
        tracing::warn!(
            remaining = pipeline.executor().in_flight_count(),
            "Shutdown timeout reached with jobs still running"
        );
    }

    // The runners hold the last notifier handles; dropping them closes the
    // bus, and the push router exits once it has forwarded what is queued.
    drop(pipeline);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), push_handle).await;
    tracing::info!("Push router stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
