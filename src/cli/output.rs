//! Handles all user-facing output for the CLI.
//!
//! Colors go to terminals only; piped output stays plain so it can be diffed or
//! parsed.

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::engine::{print_error, BatchReport};

fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Prints a line diff between the template and its rewrite.
pub fn print_transform_diff(original: &str, rewritten: &str) {
    let mut stdout = StandardStream::stdout(color_choice(atty::Stream::Stdout));
    let changeset = Changeset::new(original, rewritten, "\n");
    print_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
}

/// Prints per-file results and the totals of a batch run.
pub fn print_batch_summary(report: BatchReport) {
    let mut stdout = StandardStream::stdout(color_choice(atty::Stream::Stdout));

    for files in &report.written {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = write!(stdout, "✓ ");
        let _ = stdout.reset();
        let _ = writeln!(stdout, "{}", files.code.display());
    }

    let total = report.total();
    let failed = report.failed.len();
    for (path, error) in report.failed {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = write!(stdout, "✗ ");
        let _ = stdout.reset();
        let _ = writeln!(stdout, "{}", path.display());
        let _ = stdout.flush();
        print_error(error);
    }

    let _ = stdout.set_color(ColorSpec::new().set_bold(true));
    let _ = writeln!(stdout, "\n{} template(s): {} written, {} failed", total, total - failed, failed);
    let _ = stdout.reset();
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    let _ = writeln!(stdout, " {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "-{}", line);
                }
            }
        }
    }
}
