//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::{CompletionRequest, Part, TextModel};
use crate::{ensure_success, http_client, ProviderError};

const PROVIDER: &str = "gemini";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` makes every call fail with `MissingCredential`.
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var          | Default                                             |
    /// |------------------|-----------------------------------------------------|
    /// | `GEMINI_API_KEY` | unset                                               |
    /// | `GEMINI_MODEL`   | `gemini-2.0-flash-exp`                              |
    /// | `GEMINI_API_URL` | `https://generativelanguage.googleapis.com/v1beta`  |
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            api_url: std::env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            timeout: crate::provider_timeout_from_env(),
        }
    }
}

/// HTTP client for the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            config,
        }
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("GEMINI_API_KEY"))?;

        let body = GenerateContentRequest::from(&request);
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        );

        tracing::debug!(model = %self.config.model, parts = request.parts.len(), "Calling Gemini");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(PROVIDER, response).await?;
        let parsed: GenerateContentResponse = response.json().await?;

        parsed.into_text()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum WirePart<'a> {
    Text(&'a str),
    #[serde(rename_all = "camelCase")]
    InlineData { mime_type: &'a str, data: &'a str },
    #[serde(rename_all = "camelCase")]
    FileData { mime_type: &'a str, file_uri: &'a str },
}

impl<'a> From<&'a Part> for WirePart<'a> {
    fn from(part: &'a Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text(text),
            Part::InlineImage { mime_type, data } => WirePart::InlineData { mime_type, data },
            Part::ImageUrl { mime_type, url } => WirePart::FileData {
                mime_type,
                file_uri: url,
            },
        }
    }
}

impl<'a> From<&'a CompletionRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![WirePart::Text(&request.system)],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: request.parts.iter().map(WirePart::from).collect(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, ProviderError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = block_reason.unwrap_or_else(|| "empty response".to_string());
            return Err(ProviderError::InvalidResponse(format!("no text returned: {reason}")));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_gemini_shape() {
        let request = CompletionRequest::new("be terse")
            .with_text("hello")
            .with_part(Part::InlineImage {
                mime_type: "image/png".into(),
                data: "AAAA".into(),
            });
        let json = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be terse");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "AAAA");
    }

    #[test]
    fn url_part_serializes_as_file_data() {
        let part = Part::ImageUrl {
            mime_type: "image/jpeg".into(),
            url: "https://x.test/a.jpg".into(),
        };
        let json = serde_json::to_value(WirePart::from(&part)).unwrap();
        assert_eq!(json["fileData"]["fileUri"], "https://x.test/a.jpg");
    }

    #[test]
    fn response_text_parts_are_joined() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"html\":" }, { "text": "\"x\"}" }] } }]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "{\"html\":\"x\"}");
    }

    #[test]
    fn blocked_prompt_is_an_invalid_response() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
