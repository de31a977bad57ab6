//! Placeholder discovery for manifest authoring.
//! Walks a template tree, collects every `{{name}}` token found in file
//! contents and in file or directory names, and writes the resulting
//! `template.json` back to the template root.

use crate::constants::MANIFEST_FILE;
use crate::error::{Error, Result};
use crate::ignore::{has_excluded_extension, SkipMatcher};
use crate::manifest::Manifest;
use crate::renderer::{as_text, TemplateRenderer};
use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// What happens to manifest placeholders no longer found in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeneratePolicy {
    /// Keep every existing entry and its default; only add new names.
    #[default]
    Additive,
    /// Drop entries whose placeholder no longer appears anywhere.
    Prune,
}

pub struct Scanner<'a> {
    renderer: &'a dyn TemplateRenderer,
    exclude_extensions: &'a [String],
    policy: GeneratePolicy,
}

impl<'a> Scanner<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer, exclude_extensions: &'a [String]) -> Self {
        Self { renderer, exclude_extensions, policy: GeneratePolicy::default() }
    }

    pub fn policy(mut self, policy: GeneratePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Scans `template_root` and writes the merged manifest to its `template.json`.
    ///
    /// An existing manifest's skip rules are honoured and its curated defaults
    /// are kept. New placeholders are appended in name order with empty defaults,
    /// so running it twice on an unchanged tree writes identical bytes.
    pub fn generate<P: AsRef<Path>>(&self, template_root: P) -> Result<Manifest> {
        let template_root = template_root.as_ref();
        if !template_root.is_dir() {
            return Err(Error::TemplateDoesNotExistsError {
                template_dir: template_root.display().to_string(),
            });
        }

        let manifest_path = template_root.join(MANIFEST_FILE);
        let existing = Manifest::load_file(&manifest_path)?;
        let skip = existing.as_ref().map(|m| m.skip.as_slice()).unwrap_or_default();
        let matcher = SkipMatcher::new(skip)?;

        let found = self.scan(template_root, &matcher)?;
        debug!("Found {} placeholder(s) in '{}'", found.len(), template_root.display());

        let manifest = merge_placeholders(existing, &found, self.policy);
        manifest.save_file(&manifest_path)?;
        Ok(manifest)
    }

    /// Collects placeholder names from every entry not skipped by `matcher`.
    pub fn scan(&self, template_root: &Path, matcher: &SkipMatcher) -> Result<BTreeSet<String>> {
        let mut found = BTreeSet::new();
        let walker = WalkDir::new(template_root).min_depth(1).sort_by_file_name();
        let entries = walker.into_iter().filter_entry(|e| {
            e.path().strip_prefix(template_root).map(|rel| !matcher.is_match(rel)).unwrap_or(true)
        });

        for entry in entries {
            let entry = entry.map_err(|e| Error::ScanIoError {
                path: e.path().unwrap_or(template_root).to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();
            found.extend(self.renderer.placeholders(&entry.file_name().to_string_lossy()));

            if !entry.file_type().is_file() || has_excluded_extension(path, self.exclude_extensions)
            {
                continue;
            }
            let content = fs::read(path)
                .map_err(|source| Error::ScanIoError { path: path.to_path_buf(), source })?;
            match as_text(&content) {
                Some(text) => found.extend(self.renderer.placeholders(text)),
                None => debug!("Not scanning binary file {}", path.display()),
            }
        }
        Ok(found)
    }
}

/// Merges scanned names into an existing manifest according to `policy`.
pub fn merge_placeholders(
    existing: Option<Manifest>,
    found: &BTreeSet<String>,
    policy: GeneratePolicy,
) -> Manifest {
    let mut manifest = existing.unwrap_or_default();
    if policy == GeneratePolicy::Prune {
        manifest.placeholders.retain(|name, _| found.contains(name));
    }
    for name in found {
        if !manifest.placeholders.contains_key(name) {
            manifest.placeholders.insert(name.clone(), String::new());
        }
    }
    manifest
}
