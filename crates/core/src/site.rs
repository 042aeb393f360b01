//! Static-site assembly for deployments.
//!
//! A bundle is published as three files: an `index.html` document that
//! embeds the generated markup and links the two asset files.

use serde::Serialize;

use crate::bundle::CodeBundle;
use crate::types::DbId;

pub const INDEX_FILE: &str = "index.html";
pub const STYLES_FILE: &str = "styles.css";
pub const SCRIPT_FILE: &str = "script.js";

/// One file of a deployable static site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteFile {
    pub path: String,
    pub content: String,
}

/// Name under which a project's site is published.
pub fn site_name(project_id: DbId) -> String {
    format!("lasy-{project_id}")
}

/// Wrap the bundle markup into a complete HTML document.
pub fn render_index(bundle: &CodeBundle) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"pt-BR\">\n\
         <head>\n  \
         <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>Lasy AI App</title>\n  \
         <link rel=\"stylesheet\" href=\"{STYLES_FILE}\">\n\
         </head>\n\
         <body>\n  \
         {html}\n  \
         <script src=\"{SCRIPT_FILE}\"></script>\n\
         </body>\n\
         </html>",
        html = bundle.html,
    )
}

/// Build the file set uploaded to the deploy provider.
pub fn build_site_files(bundle: &CodeBundle) -> Vec<SiteFile> {
    vec![
        SiteFile {
            path: INDEX_FILE.to_string(),
            content: render_index(bundle),
        },
        SiteFile {
            path: STYLES_FILE.to_string(),
            content: bundle.css.clone(),
        },
        SiteFile {
            path: SCRIPT_FILE.to_string(),
            content: bundle.javascript.clone(),
        },
    ]
}
