//! Manifest validation.
//! Every check runs to completion so a single call reports the complete
//! list of defects.

use crate::constants::VCS_DIR;
use crate::error::{Error, Result};
use crate::ignore::compile_glob;
use crate::manifest::{template_root_of, Manifest, SkipRule};
use crate::renderer::Values;
use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

/// A single semantic rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{rule} rule for '{target}' references unknown placeholder '{placeholder}'")]
    UnknownPlaceholder { rule: &'static str, target: String, placeholder: String },

    #[error("regexp for placeholder '{placeholder}' is empty")]
    EmptyPattern { placeholder: String },

    #[error("regexp for placeholder '{placeholder}' does not compile: {message}")]
    InvalidPattern { placeholder: String, message: String },

    #[error("{kind} '{target}' targeted by a replace rule does not exist in the template")]
    MissingTarget { kind: &'static str, target: String },

    #[error("could not read '{path}' while checking replace targets: {message}")]
    Unreadable { path: String, message: String },

    #[error("invalid skip pattern '{pattern}': {message}")]
    InvalidSkip { pattern: String, message: String },

    #[error("value '{value}' of placeholder '{placeholder}' does not match '{regexp}'")]
    ValueMismatch { placeholder: String, value: String, regexp: String },

    #[error("schema: {0}")]
    Schema(String),
}

/// Checks a manifest against the template tree it belongs to.
///
/// Returns every violation found; an empty list means the manifest is valid.
pub fn validate<P: AsRef<Path>>(manifest: &Manifest, template_root: P) -> Vec<ValidationError> {
    let mut violations = Vec::new();

    for rule in &manifest.replace {
        if !manifest.placeholders.contains_key(rule.placeholder()) {
            violations.push(ValidationError::UnknownPlaceholder {
                rule: "replace",
                target: rule.target().to_string(),
                placeholder: rule.placeholder().to_string(),
            });
        }
    }

    for rule in &manifest.validation {
        if !manifest.placeholders.contains_key(&rule.placeholder) {
            violations.push(ValidationError::UnknownPlaceholder {
                rule: "validation",
                target: rule.regexp.clone(),
                placeholder: rule.placeholder.clone(),
            });
        }
        if rule.regexp.is_empty() {
            violations.push(ValidationError::EmptyPattern { placeholder: rule.placeholder.clone() });
        } else if let Err(e) = Regex::new(&rule.regexp) {
            violations.push(ValidationError::InvalidPattern {
                placeholder: rule.placeholder.clone(),
                message: e.to_string(),
            });
        }
    }

    for rule in &manifest.skip {
        if let SkipRule::Glob(pattern) = rule {
            if let Err(e) = compile_glob(pattern) {
                violations.push(ValidationError::InvalidSkip {
                    pattern: pattern.clone(),
                    message: e.kind().to_string(),
                });
            }
        }
    }

    if !manifest.replace.is_empty() {
        let tree = collect_names(template_root.as_ref());
        if !tree.unreadable.is_empty() {
            // targets cannot be told missing in a tree that was not fully read
            violations.extend(tree.unreadable);
            return violations;
        }
        for rule in &manifest.replace {
            let names = if rule.kind() == "directory" { &tree.dirs } else { &tree.files };
            if !names.contains(rule.target()) {
                violations.push(ValidationError::MissingTarget {
                    kind: rule.kind(),
                    target: rule.target().to_string(),
                });
            }
        }
    }

    violations
}

/// Checks resolved values against the manifest's value rules.
///
/// Rules whose regexp does not compile are left to [`validate`].
pub fn validate_values(manifest: &Manifest, values: &Values) -> Vec<ValidationError> {
    let mut violations = Vec::new();
    for rule in &manifest.validation {
        if rule.regexp.is_empty() {
            continue;
        }
        let Ok(re) = Regex::new(&rule.regexp) else { continue };
        let value = values.get(&rule.placeholder).map(String::as_str).unwrap_or_default();
        if !re.is_match(value) {
            violations.push(ValidationError::ValueMismatch {
                placeholder: rule.placeholder.clone(),
                value: value.to_string(),
                regexp: rule.regexp.clone(),
            });
        }
    }
    violations
}

/// Checks a raw manifest document against the bundled schema.
pub fn validate_schema(document: &serde_json::Value) -> Vec<ValidationError> {
    let schema: serde_json::Value = match serde_json::from_str(crate::constants::MANIFEST_SCHEMA) {
        Ok(schema) => schema,
        Err(e) => return vec![ValidationError::Schema(format!("bundled schema is unreadable: {e}"))],
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(validator) => validator,
        Err(e) => return vec![ValidationError::Schema(format!("bundled schema is invalid: {e}"))],
    };
    validator.iter_errors(document).map(|e| ValidationError::Schema(e.to_string())).collect()
}

/// Validates the manifest file at `path` against the schema and against the
/// template directory containing it.
///
/// # Errors
/// * `Error::ManifestDecodeError` if the file is not JSON or has the wrong shape
/// * `Error::ManifestValidationError` with all violations found
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    debug!("Validating manifest {}", path.display());
    let bytes = fs::read(path)?;
    let document: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(Error::ManifestDecodeError)?;

    let mut violations = validate_schema(&document);
    let manifest = match serde_json::from_value::<Manifest>(document) {
        Ok(manifest) => manifest,
        Err(e) if !violations.is_empty() => {
            debug!("Manifest shape is wrong: {e}");
            return Err(Error::ManifestValidationError(violations));
        }
        Err(e) => return Err(Error::ManifestDecodeError(e)),
    };

    violations.extend(validate(&manifest, template_root_of(path)));
    if violations.is_empty() {
        Ok(manifest)
    } else {
        Err(Error::ManifestValidationError(violations))
    }
}

/// Names present in a template tree, split by kind, plus every entry the walk could not read.
struct TreeNames {
    dirs: HashSet<String>,
    files: HashSet<String>,
    unreadable: Vec<ValidationError>,
}

fn collect_names(template_root: &Path) -> TreeNames {
    let mut dirs = HashSet::new();
    let mut files = HashSet::new();
    let mut unreadable = Vec::new();
    let walker = WalkDir::new(template_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != VCS_DIR);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                unreadable.push(ValidationError::Unreadable {
                    path: e.path().unwrap_or(template_root).display().to_string(),
                    message: e.to_string(),
                });
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() {
            dirs.insert(name);
        } else {
            files.insert(name);
        }
    }
    TreeNames { dirs, files, unreadable }
}
