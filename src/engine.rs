use std::path::{Path, PathBuf};

use log::info;
use miette::Report;

use crate::discovery::TemplateDiscoverer;
use crate::syntax::{parser, Document};
use crate::transform::{TransformOptions, TransformOutput, Transformer};
use crate::{err_msg, HtmlxError};

// ============================================================================
// ERROR DISPLAY
// ============================================================================

/// Renders an error with its source excerpt on stderr.
pub fn print_error(error: HtmlxError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Where a transformed file was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub code: PathBuf,
    pub map: PathBuf,
}

/// Result of transforming every template under a directory.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<WrittenFiles>,
    pub failed: Vec<(PathBuf, HtmlxError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// File-level driver around [`Transformer`]: read, parse, rewrite, write.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub options: TransformOptions,
}

impl Pipeline {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    // ------------------------------------------------------------------------
    // Source-level services (no I/O)
    // ------------------------------------------------------------------------

    pub fn parse_source<'src>(source: &'src str, name: &str) -> Result<Document<'src>, HtmlxError> {
        parser::parse(source, name)
    }

    /// The parsed tree as pretty JSON.
    pub fn ast_json(source: &str, name: &str) -> Result<String, HtmlxError> {
        let document = Self::parse_source(source, name)?;
        serde_json::to_string_pretty(&document)
            .map_err(|e| err_msg!(Internal, "failed to serialize syntax tree: {}", e).with_cause(e))
    }

    /// Rewrites `source`, recording `name` in the map and diagnostics.
    pub fn transform_source(&self, source: &str, name: &str) -> Result<TransformOutput, HtmlxError> {
        let options = self.options.clone().with_source_name(name);
        Transformer::new(options).transform(source)
    }

    // ------------------------------------------------------------------------
    // File-level services
    // ------------------------------------------------------------------------

    /// Reads a file with standardized error handling.
    pub fn read_file(path: &Path) -> Result<String, HtmlxError> {
        std::fs::read_to_string(path)
            .map_err(|e| err_msg!(Io, "failed to read '{}': {}", path.display(), e).with_cause(e))
    }

    /// Transforms one template and writes `<stem>.jsx` and `<stem>.jsx.map` into
    /// `out_dir`, or next to the template when no directory is given.
    pub fn transform_file(&self, path: &Path, out_dir: Option<&Path>) -> Result<WrittenFiles, HtmlxError> {
        let source = Self::read_file(path)?;
        let output = self.transform_source(&source, &display_name(path))?;

        let dir = match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let files = output_paths(path, &dir);
        Self::write_outputs(&output, &files)?;
        info!("{} -> {}", path.display(), files.code.display());
        Ok(files)
    }

    /// Writes code and map to the given paths, creating parent directories.
    pub fn write_outputs(output: &TransformOutput, files: &WrittenFiles) -> Result<(), HtmlxError> {
        if let Some(parent) = files.code.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                err_msg!(Io, "failed to create '{}': {}", parent.display(), e).with_cause(e)
            })?;
        }
        write_file(&files.code, &output.code)?;
        write_file(&files.map, &output.map_json()?)
    }

    /// Transforms every template under `root`. Failures are collected, not fatal;
    /// with `out_dir` the directory layout under `root` is mirrored there.
    pub fn transform_directory(&self, root: &Path, out_dir: Option<&Path>) -> Result<BatchReport, HtmlxError> {
        let templates = TemplateDiscoverer::discover_templates(root)?;
        info!("found {} template(s) under {}", templates.len(), root.display());

        let mut report = BatchReport::default();
        for template in templates {
            let target = out_dir.map(|dir| {
                let relative = template
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .unwrap_or_else(|| Path::new(""));
                dir.join(relative)
            });

            match self.transform_file(&template, target.as_deref()) {
                Ok(files) => report.written.push(files),
                Err(e) => report.failed.push((template, e)),
            }
        }
        Ok(report)
    }
}

/// `dir/<stem>.jsx` and `dir/<stem>.jsx.map` for a template path.
pub fn output_paths(template: &Path, dir: &Path) -> WrittenFiles {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    WrittenFiles {
        code: dir.join(format!("{}.jsx", stem)),
        map: dir.join(format!("{}.jsx.map", stem)),
    }
}

/// File name used to label a template in maps and diagnostics.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_file(path: &Path, contents: &str) -> Result<(), HtmlxError> {
    std::fs::write(path, contents)
        .map_err(|e| err_msg!(Io, "failed to write '{}': {}", path.display(), e).with_cause(e))
}
