//! Message template rendering
//!
//! A template is a plain string with `{fieldName}` placeholders that are
//! filled from a recipient row's fields. Rendering is pure: no I/O, no
//! side effects, deterministic for a given template and row.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::rows::RecipientRow;

/// Placeholder tokens are a word-character name inside braces, e.g. `{name}`.
/// Brace sequences without a valid name (`{}`, `{first name}`) are not
/// placeholders and pass through untouched.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex is valid"));

/// A message template with `{fieldName}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
}

impl Template {
    /// Create a template from a raw string
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Read a template from a UTF-8 file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        debug!(?path, "Template::load: reading template file");
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(raw))
    }

    /// The raw template text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the template is empty after trimming whitespace
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Placeholder names in order of first appearance, deduplicated
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        for caps in PLACEHOLDER_RE.captures_iter(&self.raw) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Render the template against one recipient row
    ///
    /// Every `{fieldName}` occurrence is replaced by the row's value for
    /// that field. A placeholder whose field is absent renders as the empty
    /// string rather than an error; all occurrences of the same placeholder
    /// substitute identically.
    pub fn render(&self, row: &RecipientRow) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.raw, |caps: &regex::Captures<'_>| {
                row.get(&caps[1]).unwrap_or("").to_string()
            })
            .into_owned()
    }
}
