//! # Shared test helpers
//!
//! Golden-case loading and structural checks on generated code.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use htmlx2jsx::{TransformOptions, Transformer};

/// One golden case from `tests/cases/*.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GoldenCase {
    pub name: String,
    pub input: String,
    pub expected: String,
    #[serde(default)]
    pub options: Option<TransformOptions>,
}

/// Loads every case under `dir`, tagged with the file it came from.
pub fn load_golden_cases(dir: &Path) -> Vec<(PathBuf, GoldenCase)> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    files.sort();

    let mut cases = Vec::new();
    for path in files {
        let text = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
        let parsed: Vec<GoldenCase> = serde_yaml::from_str(&text)
            .unwrap_or_else(|e| panic!("invalid case file {}: {e}", path.display()));
        cases.extend(parsed.into_iter().map(|case| (path.clone(), case)));
    }
    cases
}

/// Rewrites without the document-level `<>`/`</>` wrapper.
pub fn transform_bare(text: &str) -> String {
    let options = TransformOptions {
        wrap_fragment: false,
        ..TransformOptions::default()
    };
    match Transformer::new(options).transform(text) {
        Ok(output) => output.code,
        Err(e) => panic!("transform failed for {text:?}: {:?}", miette::Report::new(e)),
    }
}

/// Asserts braces, parens and fragment delimiters in `code` pair up.
///
/// Only meaningful for test inputs without string literals or comparison operators
/// in their expressions.
pub fn assert_balanced(code: &str) {
    let mut stack = Vec::new();
    let mut rest = code;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with("</>") {
            expect_top(&mut stack, '<', code);
            rest = &rest[3..];
            continue;
        }
        if rest.starts_with("<>") {
            stack.push('<');
            rest = &rest[2..];
            continue;
        }
        match c {
            '{' | '(' | '[' => stack.push(c),
            '}' => expect_top(&mut stack, '{', code),
            ')' => expect_top(&mut stack, '(', code),
            ']' => expect_top(&mut stack, '[', code),
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
    assert!(stack.is_empty(), "unclosed {stack:?} in {code:?}");
}

fn expect_top(stack: &mut Vec<char>, open: char, code: &str) {
    match stack.pop() {
        Some(top) if top == open => {}
        other => panic!("expected to close {open:?} but found {other:?} in {code:?}"),
    }
}
