//! The `template.json` manifest.
//! Declares the placeholders a template uses together with its skip, replace
//! and value validation rules.

use crate::constants::MANIFEST_FILE;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Characters that turn a skip entry into a glob.
const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Placeholder name to default value
    #[serde(default)]
    pub placeholders: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<SkipRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<ReplaceRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValueRule>,
}

/// A path excluded from scanning and pressing.
///
/// Persisted as a plain string; entries containing glob metacharacters are globs,
/// everything else is a literal path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkipRule {
    Literal(String),
    Glob(String),
}

impl SkipRule {
    pub fn pattern(&self) -> &str {
        match self {
            SkipRule::Literal(p) | SkipRule::Glob(p) => p,
        }
    }
}

impl From<String> for SkipRule {
    fn from(pattern: String) -> Self {
        // `{{name}}` token braces are not glob alternation
        let bare = pattern.replace("{{", "").replace("}}", "");
        if bare.contains(&GLOB_META[..]) {
            SkipRule::Glob(pattern)
        } else {
            SkipRule::Literal(pattern)
        }
    }
}

impl From<&str> for SkipRule {
    fn from(pattern: &str) -> Self {
        SkipRule::from(pattern.to_string())
    }
}

impl From<SkipRule> for String {
    fn from(rule: SkipRule) -> Self {
        match rule {
            SkipRule::Literal(p) | SkipRule::Glob(p) => p,
        }
    }
}

/// Renames a directory or file in the output after a placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplaceRule {
    Directory { target: String, placeholder: String },
    File { target: String, placeholder: String },
}

impl ReplaceRule {
    pub fn target(&self) -> &str {
        match self {
            ReplaceRule::Directory { target, .. } | ReplaceRule::File { target, .. } => target,
        }
    }

    pub fn placeholder(&self) -> &str {
        match self {
            ReplaceRule::Directory { placeholder, .. } | ReplaceRule::File { placeholder, .. } => {
                placeholder
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReplaceRule::Directory { .. } => "directory",
            ReplaceRule::File { .. } => "file",
        }
    }

    /// Whether this rule renames a path segment of the given kind.
    pub fn matches(&self, segment: &str, is_dir: bool) -> bool {
        let kind_matches = matches!(
            (self, is_dir),
            (ReplaceRule::Directory { .. }, true) | (ReplaceRule::File { .. }, false)
        );
        kind_matches && self.target() == segment
    }
}

/// A regular expression every value of `placeholder` must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueRule {
    pub placeholder: String,
    pub regexp: String,
}

impl Manifest {
    /// Parses a manifest document.
    ///
    /// # Errors
    /// * `Error::ManifestDecodeError` for malformed JSON or a wrong shape
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::ManifestDecodeError)
    }

    /// Serializes the manifest as pretty JSON with a trailing newline.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self).map_err(Error::ManifestDecodeError)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Reads the manifest at `path`, or `None` when there is no such file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        debug!("Loading manifest from {}", path.display());
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes).map(Some)
    }

    /// Reads the manifest at the root of a template, an empty one when absent.
    pub fn from_template<P: AsRef<Path>>(template_root: P) -> Result<Self> {
        let path = template_root.as_ref().join(MANIFEST_FILE);
        Ok(Self::load_file(&path)?.unwrap_or_else(|| {
            debug!("No manifest in '{}', using an empty one.", path.display());
            Self::default()
        }))
    }

    /// Writes the manifest to `path` through a temporary file in the same
    /// directory, so an existing manifest is never left half written.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_vec()?;
        let mut tmp = tempfile::NamedTempFile::new_in(template_root_of(path))?;
        tmp.write_all(&bytes)?;
        let permissions = match fs::metadata(path) {
            Ok(existing) => existing.permissions(),
            Err(_) => new_file_permissions(tmp.as_file())?,
        };
        tmp.as_file().set_permissions(permissions)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::IoError(e.error))?;
        debug!("Saved manifest to {}", path.display());
        Ok(())
    }
}

/// Mode for a manifest written where none existed; temporary files start out owner-only.
#[cfg(unix)]
fn new_file_permissions(_tmp: &fs::File) -> std::io::Result<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions(tmp: &fs::File) -> std::io::Result<fs::Permissions> {
    Ok(tmp.metadata()?.permissions())
}

/// Resolves a user supplied manifest location.
///
/// No path means the current directory; a directory means its `template.json`.
pub fn manifest_path(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    if path.is_dir() {
        Ok(path.join(MANIFEST_FILE))
    } else {
        Ok(path)
    }
}

/// The template directory a manifest file belongs to.
pub fn template_root_of(manifest_path: &Path) -> &Path {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
