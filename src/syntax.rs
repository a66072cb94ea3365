//! Syntax tree for component markup.
//!
//! The tree is shallow: the three control-flow blocks get dedicated node
//! types with the sub-spans the rewriters splice against, and everything else is an
//! [`OtherNode`] that only records its span and children.

use serde::Serialize;

pub mod parser;
pub mod walk;

/// Represents a byte range in the template text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `other` lies entirely inside this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

/// A parsed template: the original text plus its root fragment.
#[derive(Debug, Clone, Serialize)]
pub struct Document<'src> {
    #[serde(skip)]
    pub text: &'src str,
    pub fragment: Fragment,
}

/// A run of sibling nodes, e.g. a block body or element children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub span: Span,
    pub nodes: Vec<Node>,
}

/// A named binding introduced by a block (`as item`, `then value`, `catch error`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    If(IfBlock),
    Each(EachBlock),
    Await(AwaitBlock),
    Other(OtherNode),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::If(block) => block.span,
            Node::Each(block) => block.span,
            Node::Await(block) => block.span,
            Node::Other(node) => node.span,
        }
    }

    /// Returns the type name of this node (for diagnostics and logging).
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::If(_) => "IfBlock",
            Node::Each(_) => "EachBlock",
            Node::Await(_) => "AwaitBlock",
            Node::Other(node) => node.kind.type_name(),
        }
    }

    /// The fragments nested directly under this node, in source order.
    pub fn child_fragments(&self) -> Vec<&Fragment> {
        match self {
            Node::If(block) => {
                let mut fragments = Vec::new();
                let mut link = block;
                loop {
                    fragments.push(&link.consequent);
                    match &link.alternate {
                        Some(ElseBranch::ElseIf(next)) => link = next,
                        Some(ElseBranch::Else(clause)) => {
                            fragments.push(&clause.body);
                            break;
                        }
                        None => break,
                    }
                }
                fragments
            }
            Node::Each(block) => {
                let mut fragments = vec![&block.body];
                fragments.extend(block.fallback.as_ref().map(|clause| &clause.body));
                fragments
            }
            Node::Await(block) => {
                let mut fragments = Vec::new();
                if let PendingBranch::Present(pending) = &block.pending {
                    fragments.push(pending);
                }
                fragments.push(&block.then.body);
                fragments.extend(block.catch.as_ref().map(|branch| &branch.body));
                fragments
            }
            Node::Other(node) => node.children.iter().collect(),
        }
    }
}

/// `{#if expr}...{:else if expr}...{:else}...{/if}`
///
/// Else-if links are nested `IfBlock`s whose `span` starts at their `{:else if` tag
/// and ends with the chain's terminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBlock {
    pub span: Span,
    /// `{#if expr}` for the head of a chain, `{:else if expr}` for a link.
    pub open: Span,
    pub expression: Span,
    pub consequent: Fragment,
    pub alternate: Option<ElseBranch>,
}

impl IfBlock {
    /// Number of else-if links hanging off this block.
    pub fn else_if_depth(&self) -> usize {
        let mut depth = 0;
        let mut link = self;
        while let Some(ElseBranch::ElseIf(next)) = &link.alternate {
            depth += 1;
            link = next;
        }
        depth
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum ElseBranch {
    ElseIf(Box<IfBlock>),
    Else(ElseClause),
}

/// A plain `{:else}` tag and the fragment after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElseClause {
    pub tag: Span,
    pub body: Fragment,
}

/// `{#each expr as item, index (key)}...{:else}...{/each}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachBlock {
    pub span: Span,
    pub open: Span,
    pub expression: Span,
    pub context: Binding,
    /// Index name only; its position is resolved from the text after `context`.
    pub index: Option<String>,
    pub key: Option<Span>,
    pub body: Fragment,
    pub fallback: Option<ElseClause>,
}

/// `{#await expr}...{:then value}...{:catch error}...{/await}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwaitBlock {
    pub span: Span,
    pub open: Span,
    pub expression: Span,
    pub pending: PendingBranch,
    pub then: ThenBranch,
    pub catch: Option<CatchBranch>,
}

/// Whether the author wrote a pending section or the `{#await expr then value}` form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "fragment")]
pub enum PendingBranch {
    Present(Fragment),
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThenBranch {
    /// The `{:then value}` tag, or `None` in the short form where `then` sits inside
    /// the opening tag.
    pub tag: Option<Span>,
    pub value: Option<Binding>,
    pub body: Fragment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchBranch {
    pub tag: Span,
    pub error: Option<Binding>,
    pub body: Fragment,
}

/// Anything that is not a control-flow block. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherNode {
    pub kind: OtherKind,
    pub span: Span,
    pub children: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum OtherKind {
    Text,
    Comment,
    /// `{expr}`, `{@html expr}` and friends.
    Expression,
    Element(String),
    /// `script` and `style`, whose content is not markup.
    RawText(String),
    /// Any `{#name ...}` block other than if/each/await.
    Block(String),
}

impl OtherKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            OtherKind::Text => "Text",
            OtherKind::Comment => "Comment",
            OtherKind::Expression => "MustacheTag",
            OtherKind::Element(_) => "Element",
            OtherKind::RawText(_) => "RawText",
            OtherKind::Block(_) => "Block",
        }
    }
}
