//! Text-model seam and the prompts Lasy sends through it.

use async_trait::async_trait;

use crate::ProviderError;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One input part of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Base64-encoded image bytes.
    InlineImage { mime_type: String, data: String },
    /// Image the provider fetches itself.
    ImageUrl { mime_type: String, url: String },
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instructions, sent separately from the user turn.
    pub system: String,
    pub parts: Vec<Part>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            parts: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }
}

/// A generative model that turns a request into free-form text.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

pub mod prompts {
    //! Builders for every completion Lasy requests.

    use super::{CompletionRequest, Part};

    const IDEA_SYSTEM: &str = "\
You are an assistant specialised in web application ideas.
Given a user prompt, describe an application in detail, covering:
- Core features
- Suggested design
- Recommended technologies
- Differentiators

Be creative and practical.";

    const CODE_SYSTEM: &str = "\
You generate complete, working web applications.

IMPORTANT: reply with ONLY a valid JSON object of this exact shape:
{
  \"html\": \"complete HTML markup\",
  \"css\": \"complete CSS\",
  \"javascript\": \"complete JavaScript\"
}

Rules:
1. HTML: semantic, accessible structure with every element the app needs.
2. CSS: modern and responsive, using Flexbox/Grid.
3. JavaScript: functional and clean, without external dependencies when possible.
4. The code must be complete and working.
5. Never add text before or after the JSON.
6. Escape double quotes inside JSON strings as \\\".";

    const EDIT_SYSTEM: &str = "\
You edit source code.

Given a component's code and an instruction, modify the code as requested.
Reply with ONLY the modified code, without explanations.";

    const IMAGE_SYSTEM: &str = "\
Analyse this design mock-up or screenshot and extract:
1. Layout structure
2. Main colours
3. Identified components
4. Suggested typography
5. Suggested HTML/CSS

Reply with a JSON object holding this information.";

    /// Free-form app idea for a one-line prompt.
    pub fn app_idea(prompt: &str) -> CompletionRequest {
        CompletionRequest::new(IDEA_SYSTEM).with_text(prompt)
    }

    /// Full `{html, css, javascript}` bundle for `prompt`.
    ///
    /// `context` carries the existing code (or any caller-provided JSON) so
    /// the model edits rather than starts over.
    pub fn code_generation(prompt: &str, context: Option<&serde_json::Value>) -> CompletionRequest {
        let mut system = CODE_SYSTEM.to_string();
        if let Some(context) = context {
            system.push_str("\n\nExisting project context:\n");
            system.push_str(&context.to_string());
        }
        CompletionRequest::new(system).with_text(format!("Create the code for: {prompt}"))
    }

    /// Apply `instruction` to a component's source.
    pub fn edit_component(component_code: &str, instruction: &str) -> CompletionRequest {
        CompletionRequest::new(EDIT_SYSTEM).with_text(format!(
            "Current code:\n{component_code}\n\nInstruction: {instruction}"
        ))
    }

    /// Describe a design image.
    pub fn image_analysis(image: Part) -> CompletionRequest {
        CompletionRequest::new(IMAGE_SYSTEM).with_part(image)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Build the image part for an analysis request from a user-supplied URL.
///
/// `data:<mime>;base64,<payload>` URLs are sent inline; anything else is
/// passed by reference and assumed to be JPEG unless the extension says
/// otherwise.
pub fn image_part_from_url(url: &str) -> Part {
    if let Some(rest) = url.strip_prefix("data:") {
        if let Some((meta, data)) = rest.split_once(',') {
            if let Some(mime_type) = meta.strip_suffix(";base64") {
                return Part::InlineImage {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                };
            }
        }
    }

    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    let mime_type = if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    };
    Part::ImageUrl {
        mime_type: mime_type.to_string(),
        url: url.to_string(),
    }
}

/// Interpret an image-analysis reply: JSON when the model complied (with or
/// without a Markdown fence), otherwise `{"analysis": <text>}`.
pub fn parse_analysis(text: &str) -> serde_json::Value {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<serde_json::Value>(unfenced) {
        Ok(value) if value.is_object() => value,
        _ => serde_json::json!({ "analysis": text }),
    }
}
