//! Generated code bundles and their extraction from free-form model output.
//!
//! The AI provider is asked for a bare JSON object, but replies frequently
//! wrap it in prose or Markdown fences. [`extract_bundle`] scans the reply
//! for the first balanced JSON object that looks like a bundle; callers
//! fall back to [`CodeBundle::fallback`] when nothing usable is found.

use serde::{Deserialize, Serialize};

/// Markup shown when the model answered but no bundle could be extracted.
const FALLBACK_HTML: &str = "<div class=\"container\"><h1>Code generation failed</h1>\
<p>Please try again.</p></div>";

const FALLBACK_CSS: &str = ".container { max-width: 800px; margin: 0 auto; padding: 20px; \
font-family: Arial, sans-serif; }";

const FALLBACK_JS: &str = "console.log(\"Code generation failed\");";

/// One version of a project's generated code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBundle {
    pub html: String,
    pub css: String,
    pub javascript: String,
}

impl CodeBundle {
    pub fn new(
        html: impl Into<String>,
        css: impl Into<String>,
        javascript: impl Into<String>,
    ) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
            javascript: javascript.into(),
        }
    }

    /// Deterministic placeholder stored when a reply cannot be parsed.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_HTML, FALLBACK_CSS, FALLBACK_JS)
    }

    /// `true` when all three parts are blank.
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
            && self.css.trim().is_empty()
            && self.javascript.trim().is_empty()
    }
}

/// Reasons a model reply did not yield a bundle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    #[error("no JSON object with html/css/javascript fields found in response")]
    NotFound,
}

/// Wire shape accepted from the model. `js` is a tolerated alias for
/// `javascript`.
#[derive(Debug, Deserialize)]
struct RawBundle {
    html: Option<String>,
    css: Option<String>,
    javascript: Option<String>,
    js: Option<String>,
}

impl RawBundle {
    fn has_any_field(&self) -> bool {
        self.html.is_some() || self.css.is_some() || self.javascript.is_some() || self.js.is_some()
    }

    fn into_bundle(self) -> CodeBundle {
        CodeBundle {
            html: self.html.unwrap_or_default(),
            css: self.css.unwrap_or_default(),
            javascript: self.javascript.or(self.js).unwrap_or_default(),
        }
    }
}

/// Extract the first balanced JSON object carrying bundle fields from `text`.
///
/// Only top-level objects are candidates, tried in order of their opening
/// brace; an unclosed brace is skipped on its own. A candidate is
/// accepted when it parses as a JSON object with string-valued bundle
/// fields and at least one of `html`, `css`, `javascript` or `js` present.
/// Absent fields become empty strings.
pub fn extract_bundle(text: &str) -> Result<CodeBundle, BundleError> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let Some(len) = balanced_object_len(&text[start..]) else {
            search_from = start + 1;
            continue;
        };
        let candidate = &text[start..start + len];
        if let Ok(raw) = serde_json::from_str::<RawBundle>(candidate) {
            if raw.has_any_field() {
                return Ok(raw.into_bundle());
            }
        }
        // Objects nested inside a rejected candidate are never tried.
        search_from = start + len;
    }

    Err(BundleError::NotFound)
}

/// Byte length of the brace-balanced object at the start of `s`, which must
/// begin with `{`. Braces inside JSON string literals are ignored.
///
/// Returns `None` when the object is never closed.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_object() {
        let text = r#"{"html":"<p>hi</p>","css":"p{color:red}","javascript":"console.log(1)"}"#;
        let bundle = extract_bundle(text).unwrap();
        assert_eq!(bundle, CodeBundle::new("<p>hi</p>", "p{color:red}", "console.log(1)"));
    }

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let text = "Here you go:\n{\"html\":\"<main></main>\",\"css\":\"main{display:grid}\",\
                    \"javascript\":\"let a = {b: 1};\"}\nEnjoy!";
        let bundle = extract_bundle(text).unwrap();
        assert_eq!(bundle.html, "<main></main>");
        assert_eq!(bundle.css, "main{display:grid}");
        assert_eq!(bundle.javascript, "let a = {b: 1};");
    }

    #[test]
    fn extracts_object_inside_markdown_fence() {
        let text = "```json\n{\"html\": \"<h1>x</h1>\", \"css\": \"\", \"javascript\": \"\"}\n```";
        let bundle = extract_bundle(text).unwrap();
        assert_eq!(bundle.html, "<h1>x</h1>");
    }

    #[test]
    fn js_key_is_accepted_for_script() {
        let bundle = extract_bundle(r#"{"html":"a","css":"b","js":"c"}"#).unwrap();
        assert_eq!(bundle.javascript, "c");
    }

    #[test]
    fn javascript_key_wins_over_js() {
        let bundle = extract_bundle(r#"{"javascript":"long","js":"short"}"#).unwrap();
        assert_eq!(bundle.javascript, "long");
    }

    #[test]
    fn missing_fields_become_empty() {
        let bundle = extract_bundle(r#"{"html":"<p></p>"}"#).unwrap();
        assert_eq!(bundle.css, "");
        assert_eq!(bundle.javascript, "");
    }

    #[test]
    fn escaped_quotes_and_braces_in_strings_do_not_break_balancing() {
        let text = r#"ok {"html":"<p class=\"x\">}{</p>","css":"","javascript":"var s = \"}\";"} trailing }"#;
        let bundle = extract_bundle(text).unwrap();
        assert_eq!(bundle.html, "<p class=\"x\">}{</p>");
        assert_eq!(bundle.javascript, "var s = \"}\";");
    }

    #[test]
    fn skips_objects_without_bundle_fields() {
        let text = r#"meta {"model":"x"} then {"html":"<b></b>","css":"","javascript":""}"#;
        let bundle = extract_bundle(text).unwrap();
        assert_eq!(bundle.html, "<b></b>");
    }

    #[test]
    fn nested_objects_are_not_candidates() {
        assert_eq!(
            extract_bundle(r#"{"meta":{"html":"x"}}"#),
            Err(BundleError::NotFound)
        );
        assert_eq!(
            extract_bundle(r#"{"html":1,"inner":{"html":"x"}}"#),
            Err(BundleError::NotFound)
        );
        let text = r#"{"meta":{"html":"x"}} {"html":"top"}"#;
        assert_eq!(extract_bundle(text).unwrap().html, "top");
    }

    #[test]
    fn first_bundle_wins_when_several_are_present() {
        let text = r#"{"html":"first"} and {"html":"second"}"#;
        assert_eq!(extract_bundle(text).unwrap().html, "first");
    }

    #[test]
    fn prose_without_json_is_rejected() {
        assert_eq!(
            extract_bundle("Sorry, I cannot help with that."),
            Err(BundleError::NotFound)
        );
    }

    #[test]
    fn unterminated_object_is_rejected() {
        assert_eq!(
            extract_bundle(r#"{"html":"<p>never closed</p>""#),
            Err(BundleError::NotFound)
        );
    }

    #[test]
    fn fallback_is_deterministic_and_renderable() {
        assert_eq!(CodeBundle::fallback(), CodeBundle::fallback());
        assert!(!CodeBundle::fallback().is_empty());
    }

    #[test]
    fn whitespace_only_bundle_is_empty() {
        assert!(CodeBundle::new(" ", "\n", "").is_empty());
        assert!(!CodeBundle::new("", "", "x").is_empty());
    }
}
