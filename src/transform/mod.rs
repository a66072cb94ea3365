//! Template to JSX rewriting.
//!
//! One pre-order walk over the parsed document routes every if/each/await block to
//! its rewriter. Rewriters record splices against original offsets only, so the
//! order blocks are visited in never changes what a splice addresses. After the
//! walk the buffer renders the code and its source map once.

use log::debug;
use sourcemap::SourceMap;

use crate::diagnostics::to_error_source;
use crate::edit::{EditBuffer, MapSettings};
use crate::syntax::parser::parse;
use crate::syntax::walk::{walk_fragment, Visitor, Walk};
use crate::syntax::{Document, Node};
use crate::{err_msg, HtmlxError};

pub use crate::config::TransformOptions;

mod await_block;
mod conditional;
mod iteration;
pub mod locate;

pub use await_block::PROMISE_VAR;

use locate::Locator;

/// Rewritten code and the map from it back to the template.
#[derive(Debug)]
pub struct TransformOutput {
    pub code: String,
    pub map: SourceMap,
}

impl TransformOutput {
    /// The map as v3 JSON.
    pub fn map_json(&self) -> Result<String, HtmlxError> {
        let mut bytes = Vec::new();
        self.map
            .to_writer(&mut bytes)
            .map_err(|e| err_msg!(SourceMap, "failed to serialize source map: {}", e).with_cause(e))?;
        String::from_utf8(bytes)
            .map_err(|e| err_msg!(SourceMap, "source map is not UTF-8: {}", e).with_cause(e))
    }

    /// Original (line, column) for a generated position, both zero-based with
    /// UTF-16 columns.
    pub fn lookup(&self, line: u32, col: u32) -> Option<(u32, u32)> {
        self.map
            .lookup_token(line, col)
            .map(|token| (token.get_src_line(), token.get_src_col()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transformer {
    options: TransformOptions,
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    /// Parses and rewrites `text`.
    pub fn transform(&self, text: &str) -> Result<TransformOutput, HtmlxError> {
        let document = parse(text, &self.options.source_name)?;
        self.transform_document(&document)
    }

    /// Rewrites an already parsed document.
    pub fn transform_document(&self, document: &Document<'_>) -> Result<TransformOutput, HtmlxError> {
        let mut dispatcher = BlockDispatcher::new(document.text, &self.options.source_name);
        walk_fragment(&document.fragment, &mut dispatcher)?;
        debug!(
            "{}: {} block(s) rewritten, {} splice(s)",
            self.options.source_name,
            dispatcher.blocks,
            dispatcher.buffer.edits().len()
        );

        let mut buffer = dispatcher.buffer;
        if self.options.wrap_fragment {
            buffer.prepend("<>");
            buffer.append("</>");
        }

        let rendered = buffer.render(&MapSettings {
            source_name: &self.options.source_name,
            include_source_content: self.options.include_source_content,
        })?;
        Ok(TransformOutput {
            code: rendered.code,
            map: rendered.map,
        })
    }
}

/// Rewrites `text` with default options.
pub fn htmlx2jsx(text: &str) -> Result<TransformOutput, HtmlxError> {
    Transformer::default().transform(text)
}

/// Routes each control-flow block to its rewriter. Other nodes are left alone but
/// still descended into.
struct BlockDispatcher<'src> {
    locator: Locator<'src>,
    buffer: EditBuffer<'src>,
    blocks: usize,
}

impl<'src> BlockDispatcher<'src> {
    fn new(text: &'src str, source_name: &str) -> Self {
        let source = to_error_source(source_name, text);
        Self {
            locator: Locator::new(text, source.clone()),
            buffer: EditBuffer::new(text, source),
            blocks: 0,
        }
    }
}

impl Visitor for BlockDispatcher<'_> {
    fn enter(&mut self, node: &Node) -> Result<Walk, HtmlxError> {
        let span = node.span();
        match node {
            Node::If(block) => conditional::rewrite(block, &self.locator, &mut self.buffer)?,
            Node::Each(block) => iteration::rewrite(block, &self.locator, &mut self.buffer)?,
            Node::Await(block) => await_block::rewrite(block, &self.locator, &mut self.buffer)?,
            Node::Other(_) => return Ok(Walk::Continue),
        }
        debug!("rewrote {} at [{}, {})", node.type_name(), span.start, span.end);
        self.blocks += 1;
        Ok(Walk::Continue)
    }
}
