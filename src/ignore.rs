//! Skip rule handling for tmplpress templates.
//! Decides which template paths are neither scanned for placeholders nor
//! pressed into the output tree.

use crate::constants::{MANIFEST_FILE, VCS_DIR};
use crate::error::{Error, Result};
use crate::manifest::SkipRule;
use crate::validator::ValidationError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};

/// Compiled skip rules.
///
/// Matching is transitive: a path is skipped when it, or any of its parent
/// directories, matches a rule.
#[derive(Debug, Clone)]
pub struct SkipMatcher {
    literals: Vec<String>,
    globs: GlobSet,
}

/// Compiles a single glob; `*` does not cross directory separators.
pub fn compile_glob(pattern: &str) -> std::result::Result<globset::Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

impl SkipMatcher {
    /// Builds a matcher from manifest skip rules.
    ///
    /// # Errors
    /// * `Error::ManifestValidationError` listing every glob that fails to compile
    pub fn new(rules: &[SkipRule]) -> Result<Self> {
        let mut literals = Vec::new();
        let mut builder = GlobSetBuilder::new();
        let mut violations = Vec::new();

        for rule in rules {
            match rule {
                SkipRule::Literal(pattern) => literals.push(normalize(pattern)),
                SkipRule::Glob(pattern) => match compile_glob(&normalize(pattern)) {
                    Ok(glob) => {
                        builder.add(glob);
                    }
                    Err(e) => violations.push(ValidationError::InvalidSkip {
                        pattern: pattern.clone(),
                        message: e.kind().to_string(),
                    }),
                },
            }
        }
        if !violations.is_empty() {
            return Err(Error::ManifestValidationError(violations));
        }

        let globs = builder.build().map_err(|e| {
            Error::ManifestValidationError(vec![ValidationError::InvalidSkip {
                pattern: e.glob().unwrap_or_default().to_string(),
                message: e.kind().to_string(),
            }])
        })?;

        Ok(Self { literals, globs })
    }

    /// Whether a path relative to the template root is skipped.
    pub fn is_match<P: AsRef<Path>>(&self, relative: P) -> bool {
        let segments: Vec<String> = relative
            .as_ref()
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if segments.is_empty() {
            return false;
        }
        if segments.iter().any(|s| s == VCS_DIR) {
            return true;
        }
        if segments.len() == 1 && segments[0] == MANIFEST_FILE {
            return true;
        }

        (1..=segments.len()).any(|n| {
            let prefix = segments[..n].join("/");
            self.literals.iter().any(|l| *l == prefix) || self.globs.is_match(&prefix)
        })
    }
}

/// Strips `./` prefixes and trailing separators so literals compare by segment.
fn normalize(pattern: &str) -> String {
    let pattern = pattern.replace('\\', "/");
    let pattern = pattern.trim_start_matches("./");
    pattern.trim_end_matches('/').to_string()
}

/// Whether a file's extension is one of `extensions` (given without dots).
pub fn has_excluded_extension<P: AsRef<Path>>(path: P, extensions: &[String]) -> bool {
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)),
        None => false,
    }
}
