//! Clients for the external services Lasy depends on.
//!
//! - [`ai`]: the [`TextModel`](ai::TextModel) seam plus prompt builders.
//! - [`gemini`]: Gemini `generateContent` implementation of `TextModel`.
//! - [`deploy`]: the [`SiteDeployer`](deploy::SiteDeployer) seam and its
//!   Vercel implementation.
//! - [`stripe`]: checkout session creation and webhook event decoding.
//!
//! Each client is configured from the environment and never panics on a
//! missing credential; the call that needs it fails with
//! [`ProviderError::MissingCredential`] instead.

pub mod ai;
pub mod deploy;
pub mod error;
pub mod gemini;
pub mod stripe;

use std::time::Duration;

pub use error::ProviderError;

/// Default per-request timeout for outbound provider calls.
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Read `PROVIDER_TIMEOUT_SECS` (default `120`).
///
/// # Panics
///
/// Panics if the variable is set but not a valid `u64`.
pub fn provider_timeout_from_env() -> Duration {
    let secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
        .unwrap_or_else(|_| DEFAULT_PROVIDER_TIMEOUT_SECS.to_string())
        .parse()
        .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");
    Duration::from_secs(secs)
}

/// Build a `reqwest::Client` with the given request timeout.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Ensure the response has a success status code, otherwise capture the
/// status and body text as [`ProviderError::Api`].
pub(crate) async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
