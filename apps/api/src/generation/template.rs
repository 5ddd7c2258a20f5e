//! Template Loader: where the LaTeX skeleton handed to the model comes from.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Reads a template file. A missing or unreadable file yields an empty
/// template, the model then lays the document out on its own.
pub fn load_template_file(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!("Loaded template {} ({} bytes)", path.display(), content.len());
            content
        }
        Err(e) => {
            warn!(
                "Template {} not available ({e}); using an empty template",
                path.display()
            );
            String::new()
        }
    }
}

/// Reads a template the user asked for explicitly. Failure is an error.
pub fn read_template_strict(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file {}", path.display()))
}

/// A non-blank template supplied with the request wins over the default.
pub fn resolve_template<'a>(inline: Option<&'a str>, default: &'a str) -> &'a str {
    match inline {
        Some(t) if !t.trim().is_empty() => t,
        _ => default,
    }
}
