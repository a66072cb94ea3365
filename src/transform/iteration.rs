//! `{#each}` to a mapped closure.
//!
//! ```text
//! {#each E as item, i (key)}A{:else}B{/each}
//! {(E).map((item, i) => (key) && <>A</>)}B
//! ```

use crate::edit::EditBuffer;
use crate::syntax::EachBlock;
use crate::transform::locate::Locator;
use crate::HtmlxError;

const CLOSE: &str = "</>)}";

pub fn rewrite(block: &EachBlock, locator: &Locator, buffer: &mut EditBuffer) -> Result<(), HtmlxError> {
    locator.expect_at(block.open.start, "{#each")?;
    buffer.overwrite(block.open.start, block.expression.start, "{(")?;
    buffer.overwrite(block.expression.end, block.context.span.start, ").map((")?;

    // The index has no span of its own; it is the first standalone occurrence of its
    // name after the item binding.
    let params_end = match &block.index {
        Some(index) => {
            let at = locator.find_word(block.context.span.end, block.open.end, index)?;
            at + index.len()
        }
        None => block.context.span.end,
    };
    buffer.insert(params_end, ") =>")?;

    let brace = locator.closing_brace(block.open)?;
    let body_open = if block.key.is_some() { " && <>" } else { " <>" };
    buffer.overwrite(brace, brace + 1, body_open)?;

    let terminator = locator.terminator(block.span, "each")?;
    match &block.fallback {
        Some(clause) => {
            locator.expect_at(clause.tag.start, "{:else")?;
            buffer.overwrite(clause.tag.start, clause.tag.end, CLOSE)?;
            buffer.remove(terminator, block.span.end)
        }
        None => buffer.overwrite(terminator, block.span.end, CLOSE),
    }
}

#[cfg(test)]
mod tests {
    use crate::transform::tests::rewrite_bare;

    #[test]
    fn item_only() {
        assert_eq!(
            rewrite_bare("{#each items as item}<li>{item}</li>{/each}"),
            "{(items).map((item) => <><li>{item}</li></>)}"
        );
    }

    #[test]
    fn item_and_index() {
        assert_eq!(
            rewrite_bare("{#each list as x, i}<p>{x}</p>{/each}"),
            "{(list).map((x, i) => <><p>{x}</p></>)}"
        );
    }

    #[test]
    fn keyed() {
        assert_eq!(
            rewrite_bare("{#each items as item (item.id)}<li/>{/each}"),
            "{(items).map((item) => (item.id) && <><li/></>)}"
        );
        assert_eq!(
            rewrite_bare("{#each rows as row, index (row.id)}{index}{/each}"),
            "{(rows).map((row, index) => (row.id) && <>{index}</>)}"
        );
    }

    #[test]
    fn fallback_becomes_plain_markup() {
        assert_eq!(
            rewrite_bare("{#each items as item}A{:else}B{/each}"),
            "{(items).map((item) => <>A</>)}B"
        );
    }

    #[test]
    fn destructured_item() {
        assert_eq!(
            rewrite_bare("{#each pairs as [k, v]}{k}={v}{/each}"),
            "{(pairs).map(([k, v]) => <>{k}={v}</>)}"
        );
    }
}
