//! The htmlx2jsx Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use crate::cli::args::{Command, HtmlxArgs, OptionFlags};
use crate::engine::{display_name, print_error, Pipeline, WrittenFiles};
use crate::{HtmlxError, TransformOptions};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = HtmlxArgs::parse();

    let result = match args.command {
        Command::Transform {
            file,
            out,
            map,
            options,
        } => handle_transform(&file, out, map, &options),
        Command::Ast { file } => handle_ast(&file),
        Command::Diff { file, options } => handle_diff(&file, &options),
        Command::Batch {
            dir,
            out_dir,
            options,
        } => handle_batch(&dir, out_dir.as_deref(), &options),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    }
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

/// Each handler returns whether the run succeeded; hard errors go through `Err`.
type Outcome = Result<bool, HtmlxError>;

fn handle_transform(file: &Path, out: Option<PathBuf>, map: Option<PathBuf>, flags: &OptionFlags) -> Outcome {
    let pipeline = Pipeline::new(load_options(flags)?);
    let source = Pipeline::read_file(file)?;
    let output = pipeline.transform_source(&source, &display_name(file))?;

    match out {
        Some(code) => {
            let map = map.unwrap_or_else(|| {
                let mut name = code.clone().into_os_string();
                name.push(".map");
                PathBuf::from(name)
            });
            Pipeline::write_outputs(&output, &WrittenFiles { code, map })?;
        }
        None => {
            println!("{}", output.code);
            if let Some(map) = map {
                std::fs::write(&map, output.map_json()?).map_err(|e| {
                    crate::err_msg!(Io, "failed to write '{}': {}", map.display(), e).with_cause(e)
                })?;
            }
        }
    }
    Ok(true)
}

fn handle_ast(file: &Path) -> Outcome {
    let source = Pipeline::read_file(file)?;
    println!("{}", Pipeline::ast_json(&source, &display_name(file))?);
    Ok(true)
}

fn handle_diff(file: &Path, flags: &OptionFlags) -> Outcome {
    let pipeline = Pipeline::new(load_options(flags)?);
    let source = Pipeline::read_file(file)?;
    let output = pipeline.transform_source(&source, &display_name(file))?;
    output::print_transform_diff(&source, &output.code);
    Ok(true)
}

fn handle_batch(dir: &Path, out_dir: Option<&Path>, flags: &OptionFlags) -> Outcome {
    let pipeline = Pipeline::new(load_options(flags)?);
    let report = pipeline.transform_directory(dir, out_dir)?;
    let success = report.is_success();
    output::print_batch_summary(report);
    Ok(success)
}

// ============================================================================
// HELPERS
// ============================================================================

/// Config file first, then command-line flags on top.
fn load_options(flags: &OptionFlags) -> Result<TransformOptions, HtmlxError> {
    let mut options = match &flags.config {
        Some(path) => TransformOptions::from_yaml_file(path)?,
        None => TransformOptions::default(),
    };
    if flags.no_wrap {
        options.wrap_fragment = false;
    }
    if flags.no_sources_content {
        options.include_source_content = false;
    }
    Ok(options)
}
