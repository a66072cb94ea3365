use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{err_msg, HtmlxError};

pub const TEMPLATE_EXTENSION: &str = "svelte";

/// Finds component templates on disk.
#[derive(Debug)]
pub struct TemplateDiscoverer;

impl TemplateDiscoverer {
    /// Recursively scans a directory for `.svelte` files.
    ///
    /// The returned list is sorted so batch runs are deterministic.
    pub fn discover_templates<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, HtmlxError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(err_msg!(Io, "not a directory: {}", root.display()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| err_msg!(Io, "failed to walk directory: {}", e).with_cause(e))?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !Self::is_template(path) {
                continue;
            }

            files.push(path.to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    /// Returns true if the given path has a `.svelte` extension.
    pub fn is_template(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
    }
}
