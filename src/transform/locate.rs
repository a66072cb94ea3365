//! Delimiter resolution against recorded spans.
//!
//! The tree gives every tag's span; the locator turns those into the offsets of the
//! individual characters a rewriter splices (`{`, `:`, the tag's `}`, a keyword) and
//! checks each one against the text. A mismatch is a [`Delimiter`](crate::ErrorType)
//! error, never a silent fallback.

use crate::diagnostics::SourceArc;
use crate::{err_ctx, HtmlxError, Span};

pub struct Locator<'src> {
    text: &'src str,
    source: SourceArc,
}

impl<'src> Locator<'src> {
    pub fn new(text: &'src str, source: SourceArc) -> Self {
        Self { text, source }
    }

    pub fn source(&self) -> &SourceArc {
        &self.source
    }

    /// Checks that `literal` occurs at `offset` and returns the offset just past it.
    pub fn expect_at(&self, offset: usize, literal: &str) -> Result<usize, HtmlxError> {
        let end = offset + literal.len();
        match self.text.get(offset..end) {
            Some(found) if found == literal => Ok(end),
            _ => Err(self.error(
                format!("expected `{}`", literal),
                Span::new(offset.min(self.text.len()), end.min(self.text.len())),
            )),
        }
    }

    /// Offset of the `}` that closes a tag.
    pub fn closing_brace(&self, tag: Span) -> Result<usize, HtmlxError> {
        if tag.is_empty() {
            return Err(self.error("empty tag has no closing `}`".to_string(), tag));
        }
        let brace = tag.end - 1;
        self.expect_at(brace, "}")?;
        Ok(brace)
    }

    /// Offset of the block's `{/keyword}` terminator: the last `{` inside the block,
    /// which must open the closing tag and run to the block's end.
    pub fn terminator(&self, block: Span, keyword: &str) -> Result<usize, HtmlxError> {
        let body = self.text.get(block.start..block.end).unwrap_or_default();
        let Some(relative) = body.rfind('{') else {
            return Err(self.error(format!("missing `{{/{}}}`", keyword), block));
        };
        let start = block.start + relative;

        let tag_end = self.expect_at(start, &format!("{{/{}", keyword))?;
        if !self.text[tag_end..block.end].trim_start().starts_with('}') || !body.ends_with('}') {
            return Err(self.error(
                format!("malformed `{{/{}}}` terminator", keyword),
                Span::new(start, block.end),
            ));
        }
        Ok(start)
    }

    /// First occurrence of `word` in `[from, to)` standing alone as an identifier.
    pub fn find_word(&self, from: usize, to: usize, word: &str) -> Result<usize, HtmlxError> {
        let window = Span::new(from.min(to), to);
        let haystack = self.text.get(window.start..window.end).unwrap_or_default();

        let found = haystack.match_indices(word).map(|(i, _)| window.start + i).find(|&at| {
            let before = self.text[..at].chars().next_back();
            let after = self.text[at + word.len()..].chars().next();
            !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
        });

        found.ok_or_else(|| self.error(format!("expected `{}`", word), window))
    }

    fn error(&self, message: String, span: Span) -> HtmlxError {
        err_ctx!(
            Delimiter,
            message,
            &self.source,
            span,
            "the block's recorded positions do not line up with its text"
        )
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::to_error_source;
    use crate::ErrorType;

    fn locator(text: &str) -> Locator<'_> {
        Locator::new(text, to_error_source("t.svelte", text))
    }

    #[test]
    fn expect_at_verifies_literal() {
        let loc = locator("{:else if b}");
        assert_eq!(loc.expect_at(0, "{:").unwrap(), 2);
        assert_eq!(loc.expect_at(2, "else").unwrap(), 6);

        let err = loc.expect_at(1, "else").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Delimiter);
        assert!(loc.expect_at(10, "b}x").is_err());
    }

    #[test]
    fn closing_brace_is_last_char_of_tag() {
        let loc = locator("{#if a }x");
        assert_eq!(loc.closing_brace(Span::new(0, 8)).unwrap(), 7);
        assert!(loc.closing_brace(Span::new(0, 9)).is_err());
    }

    #[test]
    fn terminator_is_last_open_brace() {
        let text = "{#if a}{b}{/if }";
        let loc = locator(text);
        assert_eq!(loc.terminator(Span::new(0, text.len()), "if").unwrap(), 10);
        assert!(loc.terminator(Span::new(0, text.len()), "each").is_err());
        assert!(loc.terminator(Span::new(0, 9), "if").is_err());
    }

    #[test]
    fn find_word_respects_identifier_boundaries() {
        let text = "{#each xs as x, index (index)}";
        let loc = locator(text);
        assert_eq!(loc.find_word(14, text.len(), "index").unwrap(), 16);

        let text = "{#await thenable then v}";
        let loc = locator(text);
        assert_eq!(loc.find_word(16, text.len(), "then").unwrap(), 17);
        assert!(loc.find_word(0, 16, "then").is_err());
    }
}
