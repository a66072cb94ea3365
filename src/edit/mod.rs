//! Offset-addressed splicing over an immutable base text.
//!
//! Every splice names a range of the *original* text. Ranges must be disjoint and are
//! checked when a splice is recorded.
//!
//! Insertions are zero-width and may share an offset with each other or touch the
//! boundary of a range. At one offset, insertions come out in call order, after any
//! range that ends there and before any range that starts there.

use log::trace;
use sourcemap::{SourceMap, SourceMapBuilder};

use crate::diagnostics::{RelatedLabel, SourceArc};
use crate::{err_ctx, HtmlxError, Span};

mod line_index;

pub use line_index::LineIndex;

#[derive(Debug, Clone, PartialEq)]
pub enum EditKind {
    Overwrite(String),
    Remove,
    Insert(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub span: Span,
    pub kind: EditKind,
}

impl Edit {
    fn is_insert(&self) -> bool {
        matches!(self.kind, EditKind::Insert(_))
    }

    fn conflicts_with(&self, other: &Edit) -> bool {
        match (self.is_insert(), other.is_insert()) {
            (true, true) => false,
            (true, false) => other.span.start < self.span.start && self.span.start < other.span.end,
            (false, true) => self.span.start < other.span.start && other.span.start < self.span.end,
            (false, false) => self.span.start < other.span.end && other.span.start < self.span.end,
        }
    }
}

/// Final text plus the map from it back to the original.
#[derive(Debug)]
pub struct Rendered {
    pub code: String,
    pub map: SourceMap,
}

/// Settings for the emitted source map.
#[derive(Debug, Clone)]
pub struct MapSettings<'a> {
    pub source_name: &'a str,
    pub include_source_content: bool,
}

pub struct EditBuffer<'src> {
    original: &'src str,
    source: SourceArc,
    intro: String,
    outro: String,
    edits: Vec<Edit>,
}

impl<'src> EditBuffer<'src> {
    pub fn new(original: &'src str, source: SourceArc) -> Self {
        Self {
            original,
            source,
            intro: String::new(),
            outro: String::new(),
            edits: Vec::new(),
        }
    }

    /// The splices recorded so far, in call order.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Replaces `original[start..end]` with `text`.
    pub fn overwrite(&mut self, start: usize, end: usize, text: impl Into<String>) -> Result<(), HtmlxError> {
        self.record(Span::new(start, end), EditKind::Overwrite(text.into()))
    }

    /// Deletes `original[start..end]`.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<(), HtmlxError> {
        self.record(Span::new(start, end), EditKind::Remove)
    }

    /// Inserts `text` at original offset `at`.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) -> Result<(), HtmlxError> {
        self.record(Span::new(at, at), EditKind::Insert(text.into()))
    }

    /// Adds `text` before everything else in the output.
    pub fn prepend(&mut self, text: &str) {
        self.intro.insert_str(0, text);
    }

    /// Adds `text` after everything else in the output.
    pub fn append(&mut self, text: &str) {
        self.outro.push_str(text);
    }

    fn record(&mut self, span: Span, kind: EditKind) -> Result<(), HtmlxError> {
        let edit = Edit { span, kind };
        self.check_bounds(&edit)?;

        if let Some(existing) = self.edits.iter().find(|e| e.conflicts_with(&edit)) {
            return Err(err_ctx!(
                Edit,
                format!(
                    "splice [{}, {}) overlaps earlier splice [{}, {})",
                    span.start, span.end, existing.span.start, existing.span.end
                ),
                &self.source,
                span,
                "each original range may be rewritten by exactly one splice",
                vec![RelatedLabel {
                    span: existing.span,
                    label: "earlier splice".to_string(),
                }]
            ));
        }

        trace!("splice {:?} at [{}, {})", edit.kind, span.start, span.end);
        self.edits.push(edit);
        Ok(())
    }

    fn check_bounds(&self, edit: &Edit) -> Result<(), HtmlxError> {
        let Span { start, end } = edit.span;
        let len = self.original.len();

        let problem = if start > end || !Span::new(0, len).contains(edit.span) {
            Some(format!("range [{}, {}) is outside the text (length {})", start, end, len))
        } else if !self.original.is_char_boundary(start) || !self.original.is_char_boundary(end) {
            Some(format!("range [{}, {}) splits a character", start, end))
        } else if !edit.is_insert() && start == end {
            Some(format!("empty range at {} cannot be overwritten or removed", start))
        } else {
            None
        };

        match problem {
            Some(message) => Err(err_ctx!(
                Edit,
                message,
                &self.source,
                Span::new(start.min(len), end.min(len))
            )),
            None => Ok(()),
        }
    }

    /// Applies every splice and builds the high-resolution source map.
    pub fn render(self, settings: &MapSettings<'_>) -> Result<Rendered, HtmlxError> {
        let mut order: Vec<&Edit> = self.edits.iter().collect();
        // Stable: insertions sharing an offset keep call order.
        order.sort_by_key(|e| (e.span.start, !e.is_insert()));

        let index = LineIndex::new(self.original);
        let mut writer = MapWriter::new(&index, settings);

        writer.push_unmapped(&self.intro);

        let mut cursor = 0;
        for edit in order {
            writer.push_original(self.original, cursor, edit.span.start);
            match &edit.kind {
                EditKind::Insert(text) | EditKind::Overwrite(text) => {
                    writer.push_chunk(text, edit.span.start)
                }
                EditKind::Remove => {}
            }
            cursor = cursor.max(edit.span.end);
        }
        writer.push_original(self.original, cursor, self.original.len());

        writer.push_unmapped(&self.outro);

        if settings.include_source_content {
            writer.builder.set_source_contents(writer.source_id, Some(self.original));
        }

        Ok(Rendered {
            code: writer.code,
            map: writer.builder.into_sourcemap(),
        })
    }
}

struct MapWriter<'a> {
    index: &'a LineIndex<'a>,
    builder: SourceMapBuilder,
    source_id: u32,
    code: String,
    line: u32,
    col: u32,
}

impl<'a> MapWriter<'a> {
    fn new(index: &'a LineIndex<'a>, settings: &MapSettings<'_>) -> Self {
        let mut builder = SourceMapBuilder::new(None);
        let source_id = builder.add_source(settings.source_name);
        Self {
            index,
            builder,
            source_id,
            code: String::new(),
            line: 0,
            col: 0,
        }
    }

    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += ch.len_utf16() as u32;
            }
        }
        self.code.push_str(text);
    }

    fn push_unmapped(&mut self, text: &str) {
        self.advance(text);
    }

    /// Generated text standing in for the original at `origin`: one mapping.
    fn push_chunk(&mut self, text: &str, origin: usize) {
        if text.is_empty() {
            return;
        }
        let (src_line, src_col) = self.index.position(origin);
        self.builder
            .add_raw(self.line, self.col, src_line, src_col, Some(self.source_id), None);
        self.advance(text);
    }

    /// Untouched original text: one mapping per character.
    fn push_original(&mut self, original: &str, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let (mut src_line, mut src_col) = self.index.position(start);
        for ch in original[start..end].chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
                src_line += 1;
                src_col = 0;
            } else {
                self.builder
                    .add_raw(self.line, self.col, src_line, src_col, Some(self.source_id), None);
                let units = ch.len_utf16() as u32;
                self.col += units;
                src_col += units;
            }
            self.code.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::to_error_source;
    use crate::ErrorType;

    fn buffer(text: &str) -> EditBuffer<'_> {
        EditBuffer::new(text, to_error_source("t.svelte", text))
    }

    fn settings() -> MapSettings<'static> {
        MapSettings {
            source_name: "t.svelte",
            include_source_content: false,
        }
    }

    #[test]
    fn applies_splices_against_original_offsets() {
        let mut buf = buffer("hello world");
        buf.overwrite(0, 5, "HELLO").unwrap();
        buf.remove(5, 6).unwrap();
        buf.insert(11, "!").unwrap();
        buf.insert(6, "[").unwrap();
        buf.prepend(">");
        buf.append("<");
        let out = buf.render(&settings()).unwrap();
        assert_eq!(out.code, ">HELLO[world!<");
    }

    #[test]
    fn insert_order_at_shared_offset() {
        let mut buf = buffer("abc");
        buf.overwrite(0, 1, "A").unwrap();
        buf.insert(1, "1").unwrap();
        buf.insert(1, "2").unwrap();
        buf.overwrite(1, 2, "B").unwrap();
        let out = buf.render(&settings()).unwrap();
        assert_eq!(out.code, "A12Bc");
    }

    #[test]
    fn overlapping_ranges_fail_fast() {
        let mut buf = buffer("0123456789");
        buf.overwrite(2, 5, "x").unwrap();
        let err = buf.remove(4, 6).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Edit);
        assert!(err.message().contains("overlaps"));

        let err = buf.insert(3, "y").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Edit);

        // Touching boundaries is fine.
        buf.insert(5, "z").unwrap();
        buf.overwrite(5, 6, "w").unwrap();
    }

    #[test]
    fn rejects_out_of_range_and_empty_ranges() {
        let mut buf = buffer("abc");
        assert!(buf.overwrite(2, 9, "x").is_err());
        assert!(buf.remove(1, 1).is_err());
        assert!(buf.insert(4, "x").is_err());

        let mut buf = buffer("é");
        assert!(buf.insert(1, "x").is_err());
    }

    #[test]
    fn maps_unedited_characters_exactly() {
        let mut buf = buffer("ab\ncd");
        buf.overwrite(0, 1, "XYZ").unwrap();
        let out = buf.render(&settings()).unwrap();
        assert_eq!(out.code, "XYZb\ncd");

        let token = out.map.lookup_token(0, 3).unwrap();
        assert_eq!((token.get_src_line(), token.get_src_col()), (0, 1));
        let token = out.map.lookup_token(1, 1).unwrap();
        assert_eq!((token.get_src_line(), token.get_src_col()), (1, 1));
        // Replacement text maps to the start of what it replaced.
        let token = out.map.lookup_token(0, 0).unwrap();
        assert_eq!((token.get_src_line(), token.get_src_col()), (0, 0));
    }

    #[test]
    fn embeds_source_content_when_asked() {
        let buf = buffer("<p/>");
        let out = buf
            .render(&MapSettings {
                source_name: "page.svelte",
                include_source_content: true,
            })
            .unwrap();
        assert_eq!(out.map.get_source(0), Some("page.svelte"));
        assert_eq!(out.map.get_source_contents(0), Some("<p/>"));
    }
}
