//! Defines the command-line arguments and subcommands for the htmlx2jsx CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "htmlx2jsx",
    version,
    about = "Rewrite template control-flow blocks into JSX expressions with source maps."
)]
pub struct HtmlxArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite one template; prints the code unless `--out` is given.
    Transform {
        /// The template to rewrite.
        #[arg(required = true)]
        file: PathBuf,
        /// Write the code here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Write the source map here (defaults to `<out>.map` when `--out` is set).
        #[arg(long)]
        map: Option<PathBuf>,
        #[command(flatten)]
        options: OptionFlags,
    },
    /// Print the parsed syntax tree as JSON.
    Ast {
        /// The template to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show a colored line diff between a template and its rewrite.
    Diff {
        /// The template to rewrite.
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        options: OptionFlags,
    },
    /// Rewrite every `.svelte` file under a directory.
    Batch {
        /// The directory to scan.
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Mirror the outputs under this directory instead of next to each template.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        options: OptionFlags,
    },
}

/// Flags shared by every subcommand that rewrites.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionFlags {
    /// YAML file with transform options; flags below override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Do not wrap the output in `<>`/`</>`.
    #[arg(long)]
    pub no_wrap: bool,
    /// Leave `sourcesContent` out of the map.
    #[arg(long)]
    pub no_sources_content: bool,
}
