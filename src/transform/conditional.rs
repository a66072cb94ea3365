//! `{#if}` chains to an immediately-invoked closure of native conditionals.
//!
//! ```text
//! {#if E}A{:else if F}B{:else}C{/if}
//! {() => {if (E){<>A</>} else {if (F){<>B</>} else {<>C</>}}}}
//! ```
//!
//! The whole chain is rewritten from its head; else-if links are never dispatched on
//! their own.

use crate::edit::EditBuffer;
use crate::syntax::{ElseBranch, ElseClause, IfBlock};
use crate::transform::locate::Locator;
use crate::HtmlxError;

const OPEN: &str = "{() => {if (";
const BRANCH_OPEN: &str = "{<>";
const BRANCH_CLOSE: &str = "</>} ";
const ELSE_IF_OPEN: &str = " {if (";
const ELSE_OPEN: &str = " {<>";

pub fn rewrite(block: &IfBlock, locator: &Locator, buffer: &mut EditBuffer) -> Result<(), HtmlxError> {
    locator.expect_at(block.open.start, "{#if")?;
    buffer.overwrite(block.open.start, block.expression.start, OPEN)?;
    close_condition(block, locator, buffer)?;

    let mut link = block;
    while let Some(branch) = &link.alternate {
        match branch {
            ElseBranch::ElseIf(next) => {
                rewrite_else_if(next, locator, buffer)?;
                link = next;
            }
            ElseBranch::Else(clause) => {
                rewrite_else(clause, locator, buffer)?;
                break;
            }
        }
    }

    let terminator = locator.terminator(block.span, "if")?;
    let closing = format!("</>}}{}}}}}", "}".repeat(block.else_if_depth()));
    buffer.overwrite(terminator, block.span.end, closing)
}

/// `)` after the condition, `{<>` for the tag's `}`.
fn close_condition(link: &IfBlock, locator: &Locator, buffer: &mut EditBuffer) -> Result<(), HtmlxError> {
    buffer.insert(link.expression.end, ")")?;
    let brace = locator.closing_brace(link.open)?;
    buffer.overwrite(brace, brace + 1, BRANCH_OPEN)
}

/// Shared by both else forms: `{` closes the previous branch, `:` goes, `else` stays.
/// Returns the offset just past `else`.
fn rewrite_else_prefix(tag_start: usize, locator: &Locator, buffer: &mut EditBuffer) -> Result<usize, HtmlxError> {
    let colon = locator.expect_at(tag_start, "{")?;
    let keyword = locator.expect_at(colon, ":")?;
    let keyword_end = locator.expect_at(keyword, "else")?;

    buffer.overwrite(tag_start, colon, BRANCH_CLOSE)?;
    buffer.remove(colon, keyword)?;
    Ok(keyword_end)
}

fn rewrite_else_if(link: &IfBlock, locator: &Locator, buffer: &mut EditBuffer) -> Result<(), HtmlxError> {
    let else_end = rewrite_else_prefix(link.open.start, locator, buffer)?;
    buffer.overwrite(else_end, link.expression.start, ELSE_IF_OPEN)?;
    close_condition(link, locator, buffer)
}

fn rewrite_else(clause: &ElseClause, locator: &Locator, buffer: &mut EditBuffer) -> Result<(), HtmlxError> {
    rewrite_else_prefix(clause.tag.start, locator, buffer)?;
    let brace = locator.closing_brace(clause.tag)?;
    buffer.overwrite(brace, brace + 1, ELSE_OPEN)
}
