//! Markup parser.
//!
//! Converts template text into a [`Document`] whose nodes carry exact byte spans.
//! This parser is purely syntactic; nothing here knows about rewriting.

use pest::{
    error::{Error, InputLocation},
    iterators::{Pair, Pairs},
    Parser,
};
use pest_derive::Parser;

use crate::diagnostics::{to_error_source, SourceArc};
use crate::syntax::{
    AwaitBlock, Binding, CatchBranch, Document, EachBlock, ElseBranch, ElseClause, Fragment,
    IfBlock, Node, OtherKind, OtherNode, PendingBranch, Span, ThenBranch,
};
use crate::{err_ctx, HtmlxError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct HtmlxParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse template text into a positioned tree.
///
/// `source_name` is only used to label diagnostics.
pub fn parse<'src>(text: &'src str, source_name: &str) -> Result<Document<'src>, HtmlxError> {
    let builder = TreeBuilder {
        text,
        source: to_error_source(source_name, text),
    };

    let mut pairs =
        HtmlxParser::parse(Rule::document, text).map_err(|e| builder.convert_parse_error(e))?;

    let document = builder.expect_next(&mut pairs, Rule::document, Span::new(0, text.len()))?;
    let mut inner = document.into_inner();
    let fragment = builder.expect_next(&mut inner, Rule::fragment, Span::new(0, text.len()))?;

    Ok(Document {
        text,
        fragment: builder.build_fragment(fragment)?,
    })
}

// ============================================================================
// TREE BUILDER
// ============================================================================

struct TreeBuilder<'src> {
    text: &'src str,
    source: SourceArc,
}

impl<'src> TreeBuilder<'src> {
    fn build_fragment(&self, pair: Pair<Rule>) -> Result<Fragment, HtmlxError> {
        let span = span_of(&pair);
        let nodes = pair
            .into_inner()
            .map(|p| self.build_node(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Fragment { span, nodes })
    }

    fn build_node(&self, pair: Pair<Rule>) -> Result<Node, HtmlxError> {
        let span = span_of(&pair);

        match pair.as_rule() {
            Rule::if_block => self.build_if_block(pair).map(Node::If),
            Rule::each_block => self.build_each_block(pair).map(Node::Each),
            Rule::await_block => self.build_await_block(pair).map(Node::Await),

            Rule::text => Ok(leaf(OtherKind::Text, span)),
            Rule::comment => Ok(leaf(OtherKind::Comment, span)),
            Rule::mustache => Ok(leaf(OtherKind::Expression, span)),

            Rule::void_element => {
                let name = self.expect_next(&mut pair.into_inner(), Rule::void_name, span)?;
                Ok(leaf(OtherKind::Element(name.as_str().to_string()), span))
            }

            Rule::raw_element => {
                let name = self.expect_next(&mut pair.into_inner(), Rule::raw_name, span)?;
                Ok(leaf(OtherKind::RawText(name.as_str().to_string()), span))
            }

            Rule::element => {
                let mut name = None;
                let mut children = Vec::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::tag_name => name = Some(inner.as_str().to_string()),
                        Rule::fragment => children.push(self.build_fragment(inner)?),
                        _ => {}
                    }
                }
                let name = name.ok_or_else(|| self.missing("element name", span))?;
                Ok(Node::Other(OtherNode {
                    kind: OtherKind::Element(name),
                    span,
                    children,
                }))
            }

            Rule::other_block => {
                let mut name = None;
                let mut children = Vec::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::block_name => name = Some(inner.as_str().to_string()),
                        Rule::fragment => children.push(self.build_fragment(inner)?),
                        _ => {}
                    }
                }
                let name = name.ok_or_else(|| self.missing("block name", span))?;
                Ok(Node::Other(OtherNode {
                    kind: OtherKind::Block(name),
                    span,
                    children,
                }))
            }

            rule => Err(self.malformed(format!("unsupported rule: {:?}", rule), span)),
        }
    }

    // ------------------------------------------------------------------------
    // Conditional
    // ------------------------------------------------------------------------

    fn build_if_block(&self, pair: Pair<Rule>) -> Result<IfBlock, HtmlxError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let open = self.expect_next(&mut inner, Rule::if_open, span)?;
        let consequent = self.expect_next(&mut inner, Rule::fragment, span)?;

        let next = inner
            .next()
            .ok_or_else(|| self.missing("`{/if}`", Span::new(span.end, span.end)))?;
        let alternate = match next.as_rule() {
            Rule::if_close => None,
            _ => {
                let alternate = self.build_else_branch(next, span.end)?;
                self.expect_next(&mut inner, Rule::if_close, span)?;
                Some(alternate)
            }
        };

        self.build_if_link(span, open, consequent, alternate)
    }

    /// Builds one link of an if chain. `span.end` is always the chain's end.
    fn build_if_link(
        &self,
        span: Span,
        open: Pair<Rule>,
        consequent: Pair<Rule>,
        alternate: Option<ElseBranch>,
    ) -> Result<IfBlock, HtmlxError> {
        let open_span = span_of(&open);
        let expression = self.expect_next(&mut open.into_inner(), Rule::expression, open_span)?;

        Ok(IfBlock {
            span,
            open: open_span,
            expression: self.trimmed(span_of(&expression)),
            consequent: self.build_fragment(consequent)?,
            alternate,
        })
    }

    fn build_else_branch(&self, pair: Pair<Rule>, chain_end: usize) -> Result<ElseBranch, HtmlxError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::else_if => {
                let mut inner = pair.into_inner();
                let open = self.expect_next(&mut inner, Rule::else_if_open, span)?;
                let consequent = self.expect_next(&mut inner, Rule::fragment, span)?;
                let alternate = inner
                    .next()
                    .map(|next| self.build_else_branch(next, chain_end))
                    .transpose()?;
                let link = self.build_if_link(
                    Span::new(span.start, chain_end),
                    open,
                    consequent,
                    alternate,
                )?;
                Ok(ElseBranch::ElseIf(Box::new(link)))
            }
            Rule::else_clause => self.build_else_clause(pair).map(ElseBranch::Else),
            rule => Err(self.malformed(format!("unexpected {:?} in if block", rule), span)),
        }
    }

    fn build_else_clause(&self, pair: Pair<Rule>) -> Result<ElseClause, HtmlxError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let tag = self.expect_next(&mut inner, Rule::else_tag, span)?;
        let body = self.expect_next(&mut inner, Rule::fragment, span)?;
        Ok(ElseClause {
            tag: span_of(&tag),
            body: self.build_fragment(body)?,
        })
    }

    // ------------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------------

    fn build_each_block(&self, pair: Pair<Rule>) -> Result<EachBlock, HtmlxError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let open = self.expect_next(&mut inner, Rule::each_open, span)?;
        let open_span = span_of(&open);

        let mut expression = None;
        let mut context = None;
        let mut index = None;
        let mut key = None;
        for part in open.into_inner() {
            match part.as_rule() {
                Rule::each_expression => expression = Some(self.trimmed(span_of(&part))),
                Rule::binding => context = Some(binding_of(&part)),
                Rule::each_index => index = Some(part.as_str().to_string()),
                Rule::each_key => key = Some(self.trimmed(span_of(&part))),
                _ => {}
            }
        }

        let body = self.expect_next(&mut inner, Rule::fragment, span)?;
        let fallback = match inner.peek().map(|p| p.as_rule()) {
            Some(Rule::else_clause) => {
                let clause = self.expect_next(&mut inner, Rule::else_clause, span)?;
                Some(self.build_else_clause(clause)?)
            }
            _ => None,
        };
        self.expect_next(&mut inner, Rule::each_close, span)?;

        Ok(EachBlock {
            span,
            open: open_span,
            expression: expression.ok_or_else(|| self.missing("each expression", open_span))?,
            context: context.ok_or_else(|| self.missing("each item binding", open_span))?,
            index,
            key,
            body: self.build_fragment(body)?,
            fallback,
        })
    }

    // ------------------------------------------------------------------------
    // Await
    // ------------------------------------------------------------------------

    fn build_await_block(&self, pair: Pair<Rule>) -> Result<AwaitBlock, HtmlxError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();

        let open = inner
            .next()
            .ok_or_else(|| self.missing("`{#await ...}`", span))?;
        let open_span = span_of(&open);
        let short_form = open.as_rule() == Rule::await_short_open;

        let mut expression = None;
        let mut short_value = None;
        for part in open.into_inner() {
            match part.as_rule() {
                Rule::expression | Rule::await_expression => {
                    expression = Some(self.trimmed(span_of(&part)))
                }
                Rule::binding => short_value = Some(binding_of(&part)),
                _ => {}
            }
        }
        let expression = expression.ok_or_else(|| self.missing("awaited expression", open_span))?;

        let first = self.expect_next(&mut inner, Rule::fragment, span)?;
        let (pending, then) = if short_form {
            let then = ThenBranch {
                tag: None,
                value: short_value,
                body: self.build_fragment(first)?,
            };
            (PendingBranch::Absent, then)
        } else {
            let pending = PendingBranch::Present(self.build_fragment(first)?);
            let clause = self.expect_next(&mut inner, Rule::then_clause, span)?;
            (pending, self.build_then_clause(clause)?)
        };

        let catch = match inner.peek().map(|p| p.as_rule()) {
            Some(Rule::catch_clause) => {
                let clause = self.expect_next(&mut inner, Rule::catch_clause, span)?;
                Some(self.build_catch_clause(clause)?)
            }
            _ => None,
        };
        self.expect_next(&mut inner, Rule::await_close, span)?;

        Ok(AwaitBlock {
            span,
            open: open_span,
            expression,
            pending,
            then,
            catch,
        })
    }

    fn build_then_clause(&self, pair: Pair<Rule>) -> Result<ThenBranch, HtmlxError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let tag = self.expect_next(&mut inner, Rule::then_tag, span)?;
        let tag_span = span_of(&tag);
        let value = tag.into_inner().next().map(|b| binding_of(&b));
        let body = self.expect_next(&mut inner, Rule::fragment, span)?;
        Ok(ThenBranch {
            tag: Some(tag_span),
            value,
            body: self.build_fragment(body)?,
        })
    }

    fn build_catch_clause(&self, pair: Pair<Rule>) -> Result<CatchBranch, HtmlxError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let tag = self.expect_next(&mut inner, Rule::catch_tag, span)?;
        let tag_span = span_of(&tag);
        let error = tag.into_inner().next().map(|b| binding_of(&b));
        let body = self.expect_next(&mut inner, Rule::fragment, span)?;
        Ok(CatchBranch {
            tag: tag_span,
            error,
            body: self.build_fragment(body)?,
        })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Pulls the next pair and checks its rule.
    fn expect_next<'p>(
        &self,
        pairs: &mut Pairs<'p, Rule>,
        rule: Rule,
        span: Span,
    ) -> Result<Pair<'p, Rule>, HtmlxError> {
        match pairs.next() {
            Some(pair) if pair.as_rule() == rule => Ok(pair),
            Some(pair) => Err(self.malformed(
                format!("expected {}, found {}", rule_label(rule), rule_label(pair.as_rule())),
                span_of(&pair),
            )),
            None => Err(self.missing(&rule_label(rule), span)),
        }
    }

    /// Expression spans exclude the whitespace the grammar lets them swallow.
    fn trimmed(&self, span: Span) -> Span {
        let slice = &self.text[span.start..span.end];
        let start = span.start + (slice.len() - slice.trim_start().len());
        let end = span.end - (slice.len() - slice.trim_end().len());
        if start > end {
            Span::new(span.start, span.start)
        } else {
            Span::new(start, end)
        }
    }

    fn missing(&self, element: &str, span: Span) -> HtmlxError {
        err_ctx!(Parse, format!("missing {}", element), &self.source, span)
    }

    fn malformed(&self, construct: String, span: Span) -> HtmlxError {
        err_ctx!(Parse, format!("malformed markup: {}", construct), &self.source, span)
    }

    fn convert_parse_error(&self, error: Error<Rule>) -> HtmlxError {
        let span = match error.location {
            InputLocation::Pos(pos) => Span::new(pos, pos),
            InputLocation::Span((start, end)) => Span::new(start, end),
        };
        let error = error.renamed_rules(|rule| rule_label(*rule));
        let message = error.variant.message().into_owned();
        err_ctx!(
            Parse,
            message,
            &self.source,
            span,
            "only if/each/await blocks and plain markup are understood; check that every block is closed"
        )
    }
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

fn binding_of(pair: &Pair<Rule>) -> Binding {
    Binding {
        name: pair.as_str().to_string(),
        span: span_of(pair),
    }
}

fn leaf(kind: OtherKind, span: Span) -> Node {
    Node::Other(OtherNode {
        kind,
        span,
        children: Vec::new(),
    })
}

/// Human-readable names for grammar rules in error messages.
fn rule_label(rule: Rule) -> String {
    let label = match rule {
        Rule::if_close => "`{/if}`",
        Rule::each_close => "`{/each}`",
        Rule::await_close => "`{/await}`",
        Rule::then_clause | Rule::then_tag => "`{:then ...}`",
        Rule::catch_clause | Rule::catch_tag => "`{:catch ...}`",
        Rule::else_clause | Rule::else_tag => "`{:else}`",
        Rule::else_if | Rule::else_if_open => "`{:else if ...}`",
        Rule::if_open => "`{#if ...}`",
        Rule::each_open => "`{#each ... as ...}`",
        Rule::await_open | Rule::await_short_open => "`{#await ...}`",
        Rule::expression | Rule::each_expression | Rule::await_expression => "expression",
        Rule::each_key => "key expression",
        Rule::each_index => "index name",
        Rule::binding => "binding",
        Rule::mustache => "expression tag",
        Rule::text => "text",
        Rule::fragment => "markup",
        Rule::EOI => "end of input",
        other => return format!("{:?}", other),
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;

    fn parse_ok(text: &str) -> Document<'_> {
        match parse(text, "test.svelte") {
            Ok(doc) => doc,
            Err(e) => panic!("parse failed for {:?}: {}", text, e),
        }
    }

    fn slice(text: &str, span: Span) -> &str {
        &text[span.start..span.end]
    }

    #[test]
    fn parses_if_chain_with_spans() {
        let text = "{#if a}A{:else if b }B{:else}C{/if}";
        let doc = parse_ok(text);
        assert_eq!(doc.fragment.nodes.len(), 1);

        let Node::If(block) = &doc.fragment.nodes[0] else {
            panic!("expected if block");
        };
        assert_eq!(block.span, Span::new(0, text.len()));
        assert_eq!(slice(text, block.open), "{#if a}");
        assert_eq!(slice(text, block.expression), "a");
        assert_eq!(block.else_if_depth(), 1);

        let Some(ElseBranch::ElseIf(link)) = &block.alternate else {
            panic!("expected else-if link");
        };
        assert_eq!(slice(text, link.open), "{:else if b }");
        assert_eq!(slice(text, link.expression), "b");
        assert_eq!(link.span.end, text.len());

        let Some(ElseBranch::Else(clause)) = &link.alternate else {
            panic!("expected else clause");
        };
        assert_eq!(slice(text, clause.tag), "{:else}");
        assert_eq!(slice(text, clause.body.span), "C");
    }

    #[test]
    fn parses_each_with_index_and_key() {
        let text = "{#each items as { id, name }, i (id)}<li>{name}</li>{:else}none{/each}";
        let doc = parse_ok(text);
        let Node::Each(block) = &doc.fragment.nodes[0] else {
            panic!("expected each block");
        };
        assert_eq!(slice(text, block.expression), "items");
        assert_eq!(block.context.name, "{ id, name }");
        assert_eq!(block.index.as_deref(), Some("i"));
        assert_eq!(block.key.map(|k| slice(text, k)), Some("id"));
        assert_eq!(block.fallback.as_ref().map(|f| slice(text, f.body.span)), Some("none"));
    }

    #[test]
    fn each_expression_keeps_nested_as() {
        let text = "{#each list.map((x) => x as any) as item}{item}{/each}";
        let doc = parse_ok(text);
        let Node::Each(block) = &doc.fragment.nodes[0] else {
            panic!("expected each block");
        };
        assert_eq!(slice(text, block.expression), "list.map((x) => x as any)");
        assert_eq!(block.context.name, "item");
    }

    #[test]
    fn parses_await_forms() {
        let long = "{#await p}L{:then v}{v}{:catch e}{e}{/await}";
        let doc = parse_ok(long);
        let Node::Await(block) = &doc.fragment.nodes[0] else {
            panic!("expected await block");
        };
        assert!(matches!(block.pending, PendingBranch::Present(_)));
        assert_eq!(block.then.tag.map(|t| slice(long, t)), Some("{:then v}"));
        assert_eq!(block.then.value.as_ref().map(|v| v.name.as_str()), Some("v"));
        assert_eq!(block.catch.as_ref().map(|c| slice(long, c.tag)), Some("{:catch e}"));

        let short = "{#await fetch(url) then data}{data}{/await}";
        let doc = parse_ok(short);
        let Node::Await(block) = &doc.fragment.nodes[0] else {
            panic!("expected await block");
        };
        assert_eq!(block.pending, PendingBranch::Absent);
        assert_eq!(slice(short, block.expression), "fetch(url)");
        assert!(block.then.tag.is_none());
        assert_eq!(block.then.value.as_ref().map(|v| v.name.as_str()), Some("data"));
    }

    #[test]
    fn other_constructs_pass_through_with_children() {
        let text = "<div class=\"a {b}\">{#key k}<br>{#if x}y{/if}{/key}</div><script>if (a < b) {}</script>";
        let doc = parse_ok(text);
        assert_eq!(doc.fragment.nodes.len(), 2);
        let Node::Other(div) = &doc.fragment.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.kind, OtherKind::Element("div".into()));
        let Node::Other(key) = &div.children[0].nodes[0] else {
            panic!("expected key block");
        };
        assert_eq!(key.kind, OtherKind::Block("key".into()));
        assert!(matches!(key.children[0].nodes[1], Node::If(_)));
        assert!(matches!(
            &doc.fragment.nodes[1],
            Node::Other(OtherNode { kind: OtherKind::RawText(name), .. }) if name == "script"
        ));
    }

    #[test]
    fn doctype_and_void_names_ignore_case() {
        let text = "<!DOCTYPE html><p>{#if a}x{/if}</p>";
        let doc = parse_ok(text);
        assert_eq!(doc.fragment.nodes.len(), 2);
        let Node::Other(doctype) = &doc.fragment.nodes[0] else {
            panic!("expected doctype");
        };
        assert_eq!(doctype.kind, OtherKind::Element("!DOCTYPE".into()));
        assert_eq!(slice(text, doctype.span), "<!DOCTYPE html>");

        let text = "{#each xs as x}<BR><IMG src={x}>{/each}<SCRIPT>a < b</SCRIPT>";
        let doc = parse_ok(text);
        let Node::Each(block) = &doc.fragment.nodes[0] else {
            panic!("expected each block");
        };
        assert_eq!(block.body.nodes.len(), 2);
        assert!(matches!(
            &block.body.nodes[0],
            Node::Other(OtherNode { kind: OtherKind::Element(name), .. }) if name == "BR"
        ));
        assert!(matches!(
            &doc.fragment.nodes[1],
            Node::Other(OtherNode { kind: OtherKind::RawText(name), .. }) if name == "SCRIPT"
        ));

        let text = "<Link href=\"/\">{#if a}home{/if}</Link>";
        let doc = parse_ok(text);
        let Node::Other(link) = &doc.fragment.nodes[0] else {
            panic!("expected component");
        };
        assert_eq!(link.kind, OtherKind::Element("Link".into()));
        assert!(matches!(link.children[0].nodes[0], Node::If(_)));
    }

    #[test]
    fn expression_braces_and_strings_are_balanced() {
        let text = "{#if fn({ a: '}' }) && `${x}`}ok{/if}";
        let doc = parse_ok(text);
        let Node::If(block) = &doc.fragment.nodes[0] else {
            panic!("expected if block");
        };
        assert_eq!(slice(text, block.expression), "fn({ a: '}' }) && `${x}`");
    }

    #[test]
    fn unclosed_block_is_a_parse_error() {
        let err = parse("{#if a}<p>never closed</p>", "bad.svelte").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Parse);
        assert!(err.span().is_some());
    }

    #[test]
    fn mismatched_closing_tag_fails() {
        assert!(parse("<div></span>", "bad.svelte").is_err());
    }
}
