//! YAML error types with source-span diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors from reading or parsing a YAML document
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error("failed to read file: {0}")]
    #[diagnostic(code(variscout::yaml::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),
}

/// A YAML syntax or type error pointing at the offending location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid YAML in {filename}: {message}")]
#[diagnostic(code(variscout::yaml::syntax), help("check indentation and value types"))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    /// Build a diagnostic from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err.location().map(|loc| {
            let offset = loc.index().min(content.len());
            SourceSpan::from((offset, 1usize.min(content.len() - offset)))
        });
        Self {
            filename: filename.to_string(),
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}
