pub use crate::config::TransformOptions;
pub use crate::diagnostics::{ErrorContext, ErrorType, HtmlxError};
pub use crate::syntax::{parser::parse, Span};
pub use crate::transform::{htmlx2jsx, TransformOutput, Transformer};

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod edit;
pub mod engine;
pub mod syntax;
pub mod transform;
