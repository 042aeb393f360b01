//! Fakes and fixtures shared by the pipeline integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use lasy_core::site::SiteFile;
use lasy_db::models::project::{CreateProject, Project};
use lasy_db::models::status::ProjectStatus;
use lasy_db::models::user::CreateUser;
use lasy_db::repositories::{ProjectRepo, UserRepo};
use lasy_events::{Notifier, ProjectEvent};
use lasy_providers::ai::{CompletionRequest, TextModel};
use lasy_providers::deploy::{DeployedSite, SiteDeployer};
use lasy_providers::ProviderError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Text model that always gives the same answer and records requests.
pub struct FakeModel {
    reply: Option<String>,
    panic: bool,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            panic: false,
            requests: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            panic: false,
            requests: Mutex::default(),
        }
    }

    pub fn panicking() -> Self {
        Self {
            reply: None,
            panic: true,
            requests: Mutex::default(),
        }
    }
}

#[async_trait]
impl TextModel for FakeModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if self.panic {
            panic!("model exploded");
        }
        self.reply.clone().ok_or_else(|| ProviderError::Api {
            provider: "fake",
            status: 503,
            body: "model unavailable".to_string(),
        })
    }
}

/// Deployer that succeeds with a fixed host or fails, recording uploads.
pub struct FakeDeployer {
    fail: bool,
    url: Option<String>,
    pub uploads: Mutex<Vec<(String, Vec<SiteFile>)>>,
}

impl FakeDeployer {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            url: None,
            uploads: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            url: None,
            uploads: Mutex::default(),
        }
    }

    /// Succeeds and reports `url` instead of the derived one.
    pub fn serving(url: &str) -> Self {
        Self {
            fail: false,
            url: Some(url.to_string()),
            uploads: Mutex::default(),
        }
    }
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
        if self.fail {
            return Err(ProviderError::MissingCredential("VERCEL_TOKEN"));
        }
        Ok(DeployedSite {
            url: self
                .url
                .clone()
                .unwrap_or_else(|| format!("https://{name}.fake.app")),
            external_id: format!("dpl_{name}"),
        })
    }
}

/// Notifier that keeps every event.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<ProjectEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<ProjectEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: ProjectEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_project(pool: &PgPool, status: ProjectStatus) -> Project {
    let mut conn = pool.acquire().await.unwrap();
    let user = UserRepo::create_in(
        &mut conn,
        &CreateUser {
            email: "jobs@example.com".to_string(),
            name: "Job Tester".to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap();

    ProjectRepo::create_in(
        &mut conn,
        user.id,
        &CreateProject {
            name: "Landing page".to_string(),
            description: None,
            prompt: "A landing page for a bakery".to_string(),
        },
        status,
    )
    .await
    .unwrap()
}
