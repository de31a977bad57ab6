//! tmplpress presses new projects out of reusable templates.
//! A template is a directory tree, usually fetched from a git repository,
//! holding literal files and `{{placeholder}}` tokens plus an optional
//! `template.json` manifest describing them.

/// User answers for template placeholders
pub mod answers;

/// Command-line interface module for the tmplpress application
pub mod cli;

/// Persisted user configuration (cache directory, excluded extensions)
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling for the tmplpress application
pub mod error;

/// Skip rules for files and directories
pub mod ignore;

/// Source resolution: turns a repository location and ref into a local snapshot
pub mod loader;

/// Logging setup
pub mod logger;

/// The `template.json` manifest model
pub mod manifest;

/// The press engine that renders a template tree into an output tree
pub mod processor;

/// Placeholder token discovery and substitution
pub mod renderer;

/// Placeholder discovery for authoring manifests
pub mod scanner;

/// Manifest validation rules
pub mod validator;
