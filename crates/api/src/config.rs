use lasy_core::credits::{
    CreditCosts, DEFAULT_COST_AI_CALL, DEFAULT_COST_DEPLOY, DEFAULT_COST_EDIT_COMPONENT,
    DEFAULT_FREE_CREDITS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret. Provider credentials are loaded separately by each provider's
/// own `*Config::from_env`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Base URL of the web app, used for checkout redirects.
    pub frontend_url: String,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background jobs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Signup grant and per-action prices.
    pub credits: CreditCosts,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `FRONTEND_URL`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                    |
    /// | `DEFAULT_FREE_CREDITS`       | `100`                   |
    /// | `CREDIT_COST_AI_CALL`        | `2`                     |
    /// | `CREDIT_COST_EDIT_COMPONENT` | `5`                     |
    /// | `CREDIT_COST_DEPLOY`         | `10`                    |
    ///
    /// # Panics
    ///
    /// Panics on unparseable numbers and when `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let credits = CreditCosts {
            free_credits: env_credits("DEFAULT_FREE_CREDITS", DEFAULT_FREE_CREDITS),
            ai_call: env_credits("CREDIT_COST_AI_CALL", DEFAULT_COST_AI_CALL),
            edit_component: env_credits("CREDIT_COST_EDIT_COMPONENT", DEFAULT_COST_EDIT_COMPONENT),
            deploy: env_credits("CREDIT_COST_DEPLOY", DEFAULT_COST_DEPLOY),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            frontend_url,
            request_timeout_secs,
            shutdown_timeout_secs,
            credits,
            jwt,
        }
    }
}

/// Read a non-negative credit amount.
fn env_credits(key: &str, default: i32) -> i32 {
    let value: i32 = std::env::var(key)
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{key} must be a valid i32")))
        .unwrap_or(default);
    assert!(value >= 0, "{key} must not be negative");
    value
}
