//! Unified, `miette`-based diagnostics for the rewriting pipeline.
//!
//! Every failure produced while parsing, locating delimiters, recording splices or
//! rendering output is an [`HtmlxError`]. Construction goes through two macros:
//!
//! - `err_msg!(Variant, "message", args...)` for errors without source context.
//! - `err_ctx!(Variant, message, src, span [, help [, related]])` for errors that point
//!   into a template.
//!
//! Pass `src` as a `&SourceArc` and `span` as a [`Span`]; the macros clone and wrap.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification matching the [`HtmlxError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Malformed template syntax rejected by the grammar
    Parse,
    /// A delimiter or keyword the tree promised is not in the text
    Delimiter,
    /// Overlapping or out-of-range splices
    Edit,
    /// Source map construction or serialization
    SourceMap,
    /// File system access
    Io,
    /// Invalid configuration file
    Config,
    /// Internal invariant broken
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "parse",
            ErrorType::Delimiter => "delimiter",
            ErrorType::Edit => "edit",
            ErrorType::SourceMap => "sourcemap",
            ErrorType::Io => "io",
            ErrorType::Config => "config",
            ErrorType::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single additional label for multi-span diagnostics.
#[derive(Debug, Clone)]
pub struct RelatedLabel {
    pub span: Span,
    pub label: String,
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The template this error points into (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
    /// Additional labeled spans in the same source.
    pub related: Vec<RelatedLabel>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
            related: vec![],
        }
    }
}

/// Unified error type for every failure mode of a transform call.
#[derive(Debug, Error)]
pub enum HtmlxError {
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Delimiter error: {message}")]
    Delimiter {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Edit error: {message}")]
    Edit {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Source map error: {message}")]
    SourceMap {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl HtmlxError {
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            HtmlxError::Parse { message, ctx, .. }
            | HtmlxError::Delimiter { message, ctx, .. }
            | HtmlxError::Edit { message, ctx, .. }
            | HtmlxError::SourceMap { message, ctx, .. }
            | HtmlxError::Io { message, ctx, .. }
            | HtmlxError::Config { message, ctx, .. }
            | HtmlxError::Internal { message, ctx, .. } => (message, ctx),
        }
    }

    /// Returns the type-safe classification of this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            HtmlxError::Parse { .. } => ErrorType::Parse,
            HtmlxError::Delimiter { .. } => ErrorType::Delimiter,
            HtmlxError::Edit { .. } => ErrorType::Edit,
            HtmlxError::SourceMap { .. } => ErrorType::SourceMap,
            HtmlxError::Io { .. } => ErrorType::Io,
            HtmlxError::Config { .. } => ErrorType::Config,
            HtmlxError::Internal { .. } => ErrorType::Internal,
        }
    }

    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// The primary span, when the error points into a template.
    pub fn span(&self) -> Option<Span> {
        self.parts().1.span
    }

    /// Attaches a cause to this error, keeping message and context.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let slot = match &mut self {
            HtmlxError::Parse { source, .. }
            | HtmlxError::Delimiter { source, .. }
            | HtmlxError::Edit { source, .. }
            | HtmlxError::SourceMap { source, .. }
            | HtmlxError::Io { source, .. }
            | HtmlxError::Config { source, .. }
            | HtmlxError::Internal { source, .. } => source,
        };
        *slot = Some(Box::new(cause));
        self
    }
}

fn label_len(span: Span) -> usize {
    if span.end > span.start {
        span.end - span.start
    } else {
        1
    }
}

impl Diagnostic for HtmlxError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("htmlx2jsx::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        // Labels without source text would point at nothing.
        ctx.source.as_ref()?;

        let mut labels = Vec::new();
        if let Some(span) = ctx.span {
            labels.push(LabeledSpan::new(
                Some(message.to_string()),
                span.start,
                label_len(span),
            ));
        }
        for rel in &ctx.related {
            labels.push(LabeledSpan::new(
                Some(rel.label.clone()),
                rel.span.start,
                label_len(rel.span),
            ));
        }
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

/// Wraps template text as a named source for error contexts.
pub fn to_error_source(name: impl Into<String>, text: impl Into<String>) -> SourceArc {
    Arc::new(NamedSource::new(name.into(), text.into()))
}

/// Constructs an [`HtmlxError`] variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::HtmlxError::$variant {
            message: format!($msg, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::HtmlxError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs an [`HtmlxError`] variant pointing into a template.
///
/// Example with help and related labels:
///   `err_ctx!(Edit, "overlap", &src, span, "help text", related)`
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr, $related:expr) => {
        $crate::HtmlxError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                help: Some(format!("{}", $help)),
                related: $related,
                ..$crate::ErrorContext::with_source_and_span(
                    $crate::diagnostics::SourceArc::clone($src),
                    $span,
                )
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::err_ctx!($variant, $msg, $src, $span, $help, vec![])
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::HtmlxError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_multilabel_diagnostics() {
        let src = to_error_source("page.svelte", "{#if a}{:else}{/if}");
        let related = vec![RelatedLabel {
            span: Span { start: 7, end: 14 },
            label: "else branch here".to_string(),
        }];
        let err = err_ctx!(
            Edit,
            "overlapping splice",
            &src,
            Span { start: 0, end: 7 },
            "splices must address disjoint ranges",
            related
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("else branch here"));
        assert!(output.contains("splices must address disjoint ranges"));
        assert!(output.contains("htmlx2jsx::edit"));
    }

    #[test]
    fn test_error_chaining() {
        let src = to_error_source("page.svelte", "{#if a}");
        let cause = err_ctx!(Parse, "expected `{/if}`", &src, Span { start: 7, end: 7 });
        let err = err_msg!(Io, "failed to transform {}", "page.svelte").with_cause(cause);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("failed to transform page.svelte"));
        assert!(output.contains("expected `{/if}`"));
    }

    #[test]
    fn test_classification_and_accessors() {
        let src = to_error_source("x", "{#each}");
        let err = err_ctx!(Delimiter, "expected `}`", &src, Span { start: 6, end: 7 });
        assert_eq!(err.error_type(), ErrorType::Delimiter);
        assert_eq!(err.message(), "expected `}`");
        assert_eq!(err.span(), Some(Span { start: 6, end: 7 }));
        assert_eq!(err.to_string(), "Delimiter error: expected `}`");
        assert!(err.source_code().is_some());
        assert!(err.help().is_none());

        let err = err_ctx!(Delimiter, "expected `}`", &src, Span { start: 6, end: 7 }, "check the tag");
        assert_eq!(err.span(), Some(Span { start: 6, end: 7 }));
        assert_eq!(err.help().map(|h| h.to_string()), Some("check the tag".to_string()));

        let bare = err_msg!(Internal, "no context");
        assert!(bare.span().is_none());
        assert!(bare.labels().is_none());
    }
}
