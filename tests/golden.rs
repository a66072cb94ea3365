//! YAML-driven golden cases: `tests/cases/*.yaml`, each a list of
//! `{ name, input, expected, options? }`.

mod common;

use std::path::Path;

use common::{assert_balanced, load_golden_cases};
use htmlx2jsx::Transformer;

#[test]
fn golden_cases() {
    let cases = load_golden_cases(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases"));
    assert!(!cases.is_empty(), "no golden cases found");

    let mut failures = Vec::new();
    for (file, case) in &cases {
        let options = case.options.clone().unwrap_or_default();
        match Transformer::new(options).transform(&case.input) {
            Ok(output) if output.code == case.expected => assert_balanced(&output.code),
            Ok(output) => failures.push(format!(
                "{} / {}\n  expected: {:?}\n  actual:   {:?}",
                file.display(),
                case.name,
                case.expected,
                output.code
            )),
            Err(e) => failures.push(format!(
                "{} / {}\n{:?}",
                file.display(),
                case.name,
                miette::Report::new(e)
            )),
        }
    }

    assert!(
        failures.is_empty(),
        "{} of {} golden case(s) failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}
