//! Transform options and their YAML form.
//!
//! ```yaml
//! source_name: Button.svelte
//! include_source_content: false
//! wrap_fragment: true
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{err_msg, HtmlxError};

pub const DEFAULT_SOURCE_NAME: &str = "input.svelte";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    /// Name recorded in the map's `sources` and in diagnostics.
    pub source_name: String,
    /// Embed the original text as `sourcesContent`.
    pub include_source_content: bool,
    /// Surround the output with `<>`/`</>` so the document is one expression.
    pub wrap_fragment: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            include_source_content: true,
            wrap_fragment: true,
        }
    }
}

impl TransformOptions {
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, HtmlxError> {
        // An empty document deserializes as unit, not as an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Config, "invalid transform options: {}", e).with_cause(e))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, HtmlxError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            err_msg!(Config, "failed to read config '{}': {}", path.display(), e).with_cause(e)
        })?;
        Self::from_yaml_str(&text)
    }
}
