//! Static-site deployment seam and the Vercel implementation.

use std::time::Duration;

use async_trait::async_trait;
use lasy_core::site::SiteFile;
use serde::{Deserialize, Serialize};

use crate::{ensure_success, http_client, ProviderError};

const PROVIDER: &str = "vercel";
const DEFAULT_API_URL: &str = "https://api.vercel.com";

/// A site that went live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedSite {
    /// Public `https://` URL.
    pub url: String,
    /// Provider-side deployment identifier.
    pub external_id: String,
}

/// Uploads a named set of files and returns where they are served.
#[async_trait]
pub trait SiteDeployer: Send + Sync {
    /// Short provider name recorded on each deployment row.
    fn provider_name(&self) -> &'static str;

    async fn deploy(&self, name: &str, files: &[SiteFile]) -> Result<DeployedSite, ProviderError>;
}

// ---------------------------------------------------------------------------
// Vercel
// ---------------------------------------------------------------------------

/// Vercel client configuration.
#[derive(Debug, Clone)]
pub struct VercelConfig {
    /// `None` makes every deploy fail with `MissingCredential`.
    pub token: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
}

impl VercelConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var          | Default                  |
    /// |------------------|--------------------------|
    /// | `VERCEL_TOKEN`   | unset                    |
    /// | `VERCEL_API_URL` | `https://api.vercel.com` |
    pub fn from_env() -> Self {
        Self {
            token: std::env::var("VERCEL_TOKEN").ok().filter(|t| !t.is_empty()),
            api_url: std::env::var("VERCEL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            timeout: crate::provider_timeout_from_env(),
        }
    }
}

/// HTTP client for Vercel's `POST /v13/deployments`.
pub struct VercelClient {
    client: reqwest::Client,
    config: VercelConfig,
}

impl VercelClient {
    pub fn new(config: VercelConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDeployment<'a> {
    name: &'a str,
    files: Vec<InlineFile<'a>>,
    project_settings: ProjectSettings,
}

#[derive(Debug, Serialize)]
struct InlineFile<'a> {
    file: &'a str,
    data: &'a str,
    encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct ProjectSettings {
    /// Plain static files, no framework preset.
    framework: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct DeploymentCreated {
    id: String,
    /// Hostname without scheme.
    url: String,
}

#[async_trait]
impl SiteDeployer for VercelClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn deploy(&self, name: &str, files: &[SiteFile]) -> Result<DeployedSite, ProviderError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(ProviderError::MissingCredential("VERCEL_TOKEN"))?;

        let body = CreateDeployment {
            name,
            files: files
                .iter()
                .map(|f| InlineFile {
                    file: &f.path,
                    data: &f.content,
                    encoding: "utf-8",
                })
                .collect(),
            project_settings: ProjectSettings { framework: None },
        };

        let response = self
            .client
            .post(format!(
                "{}/v13/deployments",
                self.config.api_url.trim_end_matches('/')
            ))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(PROVIDER, response).await?;
        let created: DeploymentCreated = response.json().await?;

        Ok(DeployedSite {
            url: public_url(&created.url),
            external_id: created.id,
        })
    }
}

/// Vercel reports bare hostnames; clients need a full URL.
fn public_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
