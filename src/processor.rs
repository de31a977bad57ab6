//! The press engine.
//! Turns a template tree, its manifest and an answer set into an output tree.
//! Each run goes through load, validate, guard and walk stages in order and
//! writes nothing until the whole tree has been planned.

use log::{debug, warn};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::answers::AnswerSet;
use crate::config::UserConfig;
use crate::error::{Error, Result};
use crate::ignore::{has_excluded_extension, SkipMatcher};
use crate::manifest::Manifest;
use crate::renderer::{as_text, resolve_values, TemplateRenderer, Values};
use crate::validator::{validate, validate_values};

/// A single write planned by the walk stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    CreateDir { target: PathBuf },
    Copy { source: PathBuf, target: PathBuf },
    Write { target: PathBuf, content: String },
}

impl FileOperation {
    pub fn target(&self) -> &Path {
        match self {
            FileOperation::CreateDir { target }
            | FileOperation::Copy { target, .. }
            | FileOperation::Write { target, .. } => target,
        }
    }

    fn apply(&self) -> Result<()> {
        debug!("{}", self);
        let target = self.target();
        let io_err = |source: std::io::Error| Error::RenderIoError { path: target.to_path_buf(), source };
        match self {
            FileOperation::CreateDir { target } => fs::create_dir_all(target).map_err(io_err),
            FileOperation::Copy { source, target } => {
                create_parent(target)?;
                fs::copy(source, target).map(|_| ()).map_err(io_err)
            }
            FileOperation::Write { target, content } => {
                create_parent(target)?;
                fs::write(target, content).map_err(io_err)
            }
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            FileOperation::CreateDir { .. } => "Creating",
            FileOperation::Copy { .. } => "Copying",
            FileOperation::Write { .. } => "Rendering",
        };
        write!(f, "{}: '{}'", action, self.target().display())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|source| Error::RenderIoError { path: parent.to_path_buf(), source }),
        None => Ok(()),
    }
}

/// Plans the output of one template tree for one set of values.
pub struct Processor<'a> {
    renderer: &'a dyn TemplateRenderer,
    template_root: &'a Path,
    output_root: &'a Path,
    manifest: &'a Manifest,
    values: &'a Values,
    exclude_extensions: &'a [String],
}

impl<'a> Processor<'a> {
    pub fn new(
        renderer: &'a dyn TemplateRenderer,
        template_root: &'a Path,
        output_root: &'a Path,
        manifest: &'a Manifest,
        values: &'a Values,
        exclude_extensions: &'a [String],
    ) -> Self {
        Self { renderer, template_root, output_root, manifest, values, exclude_extensions }
    }

    /// Computes the output path for a path relative to the template root.
    ///
    /// Segments named by a replace rule take the rule's placeholder value; all
    /// other segments have their tokens rendered. Returns `None` when a segment
    /// renders to nothing, which drops the entry.
    pub fn resolve_target_path(&self, relative: &Path, is_dir: bool) -> Result<Option<PathBuf>> {
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let mut target = self.output_root.to_path_buf();
        for (i, segment) in segments.iter().enumerate() {
            let segment_is_dir = is_dir || i + 1 < segments.len();
            let rule = self.manifest.replace.iter().find(|r| r.matches(segment, segment_is_dir));
            let rendered = match rule {
                Some(rule) => self.values.get(rule.placeholder()).cloned().unwrap_or_default(),
                None => self.renderer.render(segment, self.values),
            };

            if rendered.is_empty() {
                debug!("Skipping '{}' as '{}' renders empty", relative.display(), segment);
                return Ok(None);
            }
            if !is_rendered_segment_valid(&rendered) {
                return Err(Error::InvalidOutputPath {
                    path: relative.to_path_buf(),
                    segment: rendered,
                });
            }
            target.push(rendered);
        }
        Ok(Some(target))
    }

    /// Plans the operation for a single template entry.
    pub fn process(&self, path: &Path, is_dir: bool) -> Result<Option<FileOperation>> {
        let relative = path.strip_prefix(self.template_root).map_err(|_| Error::InvalidOutputPath {
            path: path.to_path_buf(),
            segment: String::new(),
        })?;
        let Some(target) = self.resolve_target_path(relative, is_dir)? else {
            return Ok(None);
        };

        if is_dir {
            return Ok(Some(FileOperation::CreateDir { target }));
        }
        if has_excluded_extension(path, self.exclude_extensions) {
            debug!("Copying excluded extension {}", path.display());
            return Ok(Some(FileOperation::Copy { source: path.to_path_buf(), target }));
        }

        let content = fs::read(path)
            .map_err(|source| Error::RenderIoError { path: path.to_path_buf(), source })?;
        match as_text(&content) {
            Some(text) => Ok(Some(FileOperation::Write {
                target,
                content: self.renderer.render(text, self.values),
            })),
            None => Ok(Some(FileOperation::Copy { source: path.to_path_buf(), target })),
        }
    }

    /// Walks the template in lexical order, parents before children, and
    /// plans every operation. Skipped directories are not descended into.
    pub fn plan(&self, matcher: &SkipMatcher) -> Result<Vec<FileOperation>> {
        let root = self.template_root;
        let walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        let entries = walker.into_iter().filter_entry(|e| {
            e.path().strip_prefix(root).map(|rel| !matcher.is_match(rel)).unwrap_or(true)
        });

        let mut operations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::RenderIoError {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;
            debug!("Processing source file: {}", entry.path().display());
            if let Some(operation) = self.process(entry.path(), entry.file_type().is_dir())? {
                operations.push(operation);
            }
        }
        Ok(operations)
    }
}

/// A rendered path segment must be a single, plain path component.
pub fn is_rendered_segment_valid(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
        && !segment.contains('\0')
}

/// Makes `path` absolute and resolves `.`/`..` and symlinks as far as the path exists.
fn absolute_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }

    let mut existing = normalized.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(normalized),
        }
    }
    let mut resolved = fs::canonicalize(existing)?;
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

/// Fails when the output root is, contains, or lies inside the template root.
pub fn check_guard<P: AsRef<Path>, Q: AsRef<Path>>(template_root: P, output_root: Q) -> Result<()> {
    let template = absolute_path(template_root.as_ref())?;
    let output = absolute_path(output_root.as_ref())?;
    if output.starts_with(&template) || template.starts_with(&output) {
        return Err(Error::GuardViolation { template_dir: template, output_dir: output });
    }
    Ok(())
}

/// Renders templates with the settings from the user configuration.
pub struct Press<'a> {
    renderer: &'a dyn TemplateRenderer,
    exclude_extensions: &'a [String],
}

impl<'a> Press<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer, config: &'a UserConfig) -> Self {
        Self { renderer, exclude_extensions: &config.exclude_file_extensions }
    }

    /// Presses `template_root` into `output_root`.
    ///
    /// # Returns
    /// * The operations that were applied, in order
    ///
    /// # Errors
    /// * `Error::ManifestValidationError` before anything is written
    /// * `Error::GuardViolation` if the output overlaps the template
    /// * `Error::OutputDirectoryExistsError` if the output exists and `force` is off
    /// * `Error::RenderIoError` naming the path that failed; the output root is
    ///   removed again when this run created it
    pub fn run(
        &self,
        template_root: &Path,
        output_root: &Path,
        answers: &AnswerSet,
        force: bool,
    ) -> Result<Vec<FileOperation>> {
        if !template_root.is_dir() {
            return Err(Error::TemplateDoesNotExistsError {
                template_dir: template_root.display().to_string(),
            });
        }

        // load
        let manifest = Manifest::from_template(template_root)?;
        let values = resolve_values(&manifest, answers);

        // validate
        let mut violations = validate(&manifest, template_root);
        violations.extend(validate_values(&manifest, &values));
        if !violations.is_empty() {
            return Err(Error::ManifestValidationError(violations));
        }
        let matcher = SkipMatcher::new(&manifest.skip)?;

        // guard
        check_guard(template_root, output_root)?;
        let existed = output_root.exists();
        if existed && !force {
            return Err(Error::OutputDirectoryExistsError {
                output_dir: output_root.display().to_string(),
            });
        }

        // walk
        let processor = Processor::new(
            self.renderer,
            template_root,
            output_root,
            &manifest,
            &values,
            self.exclude_extensions,
        );
        let operations = processor.plan(&matcher)?;

        let result = fs::create_dir_all(output_root)
            .map_err(|source| Error::RenderIoError { path: output_root.to_path_buf(), source })
            .and_then(|_| operations.iter().try_for_each(FileOperation::apply));
        if let Err(e) = result {
            if !existed {
                if let Err(cleanup) = fs::remove_dir_all(output_root) {
                    warn!("Could not remove partial output '{}': {}", output_root.display(), cleanup);
                }
            }
            return Err(e);
        }
        Ok(operations)
    }
}
