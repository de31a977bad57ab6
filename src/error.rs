//! Error handling for tmplpress.
//! Defines the crate-wide error type and the stage each failure belongs to.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::validator::ValidationError;

/// Pipeline stage a failure is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Validate,
    Scan,
    Render,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Validate => "validate",
            Stage::Scan => "scan",
            Stage::Render => "render",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Custom error types for tmplpress operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// The git binary could not be started at all
    #[error("could not run git {args}: {source}.")]
    GitLaunchError {
        args: String,
        #[source]
        source: io::Error,
    },

    /// git ran but exited with a non-zero status
    #[error("git {args} exited with code {code}: {output}")]
    GitCommandError { args: String, code: i32, output: String },

    #[error("no tags found in '{location}'.")]
    NoTagsFound { location: String },

    #[error("'{revision}' is not a commit hash.")]
    InvalidRevision { revision: String },

    #[error("Template directory does not exist: {template_dir}.")]
    TemplateDoesNotExistsError { template_dir: String },

    #[error("could not decode manifest: {0}.")]
    ManifestDecodeError(#[source] serde_json::Error),

    /// One or more semantic rule violations, reported together
    #[error("manifest is invalid:\n{}", format_violations(.0))]
    ManifestValidationError(Vec<ValidationError>),

    #[error("could not read '{}' while scanning: {source}.", .path.display())]
    ScanIoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not process '{}': {source}.", .path.display())]
    RenderIoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "output directory '{}' overlaps the template directory '{}'.",
        .output_dir.display(),
        .template_dir.display()
    )]
    GuardViolation { template_dir: PathBuf, output_dir: PathBuf },

    #[error("Output directory already exists: {output_dir}. Use --force to overwrite it.")]
    OutputDirectoryExistsError { output_dir: String },

    #[error("rendered path segment '{segment}' of '{}' is not valid.", .path.display())]
    InvalidOutputPath { path: PathBuf, segment: String },

    #[error("could not read answers: {0}.")]
    AnswersError(String),

    /// Represents errors in the user configuration
    #[error("Configuration error: {0}.")]
    ConfigError(String),
}

fn format_violations(violations: &[ValidationError]) -> String {
    violations.iter().map(|v| format!("  - {v}")).collect::<Vec<_>>().join("\n")
}

impl Error {
    /// Returns the pipeline stage this error is reported under.
    pub fn stage(&self) -> Stage {
        match self {
            Error::GitLaunchError { .. }
            | Error::GitCommandError { .. }
            | Error::NoTagsFound { .. }
            | Error::InvalidRevision { .. }
            | Error::TemplateDoesNotExistsError { .. } => Stage::Resolve,
            Error::ManifestDecodeError(_)
            | Error::ManifestValidationError(_)
            | Error::AnswersError(_) => Stage::Validate,
            Error::ScanIoError { .. } => Stage::Scan,
            Error::IoError(_)
            | Error::RenderIoError { .. }
            | Error::GuardViolation { .. }
            | Error::OutputDirectoryExistsError { .. }
            | Error::InvalidOutputPath { .. } => Stage::Render,
            Error::ConfigError(_) => Stage::Config,
        }
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints `<stage>: <message>` to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}: {}", err.stage(), err);
    std::process::exit(1);
}
