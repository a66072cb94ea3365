//! `{#await}` to a promise continuation chain.
//!
//! ```text
//! {#await P}L{:then v}A{:catch e}B{/await}
//! {() => {let _$$p = (P); <>L</>; _$$p.then((v) => {<>A</>}).catch((e) => {<>B</>})}}
//! ```

use crate::edit::EditBuffer;
use crate::syntax::{AwaitBlock, Binding, PendingBranch};
use crate::transform::locate::Locator;
use crate::HtmlxError;

/// Local the awaited expression is bound to inside the generated closure.
pub const PROMISE_VAR: &str = "_$$p";

pub fn rewrite(block: &AwaitBlock, locator: &Locator, buffer: &mut EditBuffer) -> Result<(), HtmlxError> {
    locator.expect_at(block.open.start, "{#await")?;
    buffer.overwrite(
        block.open.start,
        block.expression.start,
        format!("{{() => {{let {} = (", PROMISE_VAR),
    )?;
    buffer.insert(block.expression.end, ");")?;

    let attach = then_attach(block.then.value.as_ref());
    match (&block.pending, block.then.tag) {
        (PendingBranch::Present(_), Some(tag)) => {
            let brace = locator.closing_brace(block.open)?;
            locator.expect_at(tag.start, "{:then")?;
            buffer.overwrite(brace, brace + 1, " <>")?;
            buffer.insert(tag.start, "</>; ")?;
            buffer.overwrite(tag.start, tag.end, attach)?;
        }
        (PendingBranch::Absent, None) => {
            let then = locator.find_word(block.expression.end, block.open.end, "then")?;
            locator.closing_brace(block.open)?;
            buffer.overwrite(then, block.open.end, attach)?;
        }
        (PendingBranch::Present(_), None) => {
            return Err(crate::err_ctx!(
                Internal,
                "await block with a pending branch has no `{:then}` tag",
                locator.source(),
                block.span
            ));
        }
        (PendingBranch::Absent, Some(tag)) => {
            return Err(crate::err_ctx!(
                Internal,
                "short-form await block carries a separate `{:then}` tag",
                locator.source(),
                tag
            ));
        }
    }

    if let Some(catch) = &block.catch {
        locator.expect_at(catch.tag.start, "{:catch")?;
        buffer.overwrite(
            catch.tag.start,
            catch.tag.end,
            format!("</>}}).catch(({}) => {{<>", param(catch.error.as_ref())),
        )?;
    }

    let terminator = locator.terminator(block.span, "await")?;
    buffer.overwrite(terminator, block.span.end, "</>})}}")
}

fn then_attach(value: Option<&Binding>) -> String {
    format!("{}.then(({}) => {{<>", PROMISE_VAR, param(value))
}

fn param(binding: Option<&Binding>) -> &str {
    binding.map(|b| b.name.as_str()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::transform::tests::rewrite_bare;

    #[test]
    fn pending_then() {
        assert_eq!(
            rewrite_bare("{#await p}L{:then v}{v}{/await}"),
            "{() => {let _$$p = (p); <>L</>; _$$p.then((v) => {<>{v}</>})}}"
        );
    }

    #[test]
    fn short_form() {
        assert_eq!(
            rewrite_bare("{#await p then v}{v}{/await}"),
            "{() => {let _$$p = (p); _$$p.then((v) => {<>{v}</>})}}"
        );
        assert_eq!(
            rewrite_bare("{#await load() then}done{/await}"),
            "{() => {let _$$p = (load()); _$$p.then(() => {<>done</>})}}"
        );
    }

    #[test]
    fn catch_stage() {
        assert_eq!(
            rewrite_bare("{#await p}{:then v}A{:catch e}B{/await}"),
            "{() => {let _$$p = (p); <></>; _$$p.then((v) => {<>A</>}).catch((e) => {<>B</>})}}"
        );
        assert_eq!(
            rewrite_bare("{#await p then v}A{:catch}B{/await}"),
            "{() => {let _$$p = (p); _$$p.then((v) => {<>A</>}).catch(() => {<>B</>})}}"
        );
    }

    #[test]
    fn then_without_value() {
        assert_eq!(
            rewrite_bare("{#await p}wait{:then}ok{/await}"),
            "{() => {let _$$p = (p); <>wait</>; _$$p.then(() => {<>ok</>})}}"
        );
    }
}
