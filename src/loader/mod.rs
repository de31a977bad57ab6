//! Template source resolution.
//! Turns a repository location plus an optional ref into a local snapshot
//! pinned to a commit hash.

use crate::constants::VCS_DIR;
use crate::error::{Error, Result};
use crate::loader::interface::{CloneSpec, VersionControl};
use log::{debug, info, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

pub mod git;
pub mod interface;
pub mod local;

pub use git::GitCli;
pub use local::LocalLoader;

/// Remote-tracking ref of the origin's default branch.
const UPSTREAM_HEAD: &str = "origin/HEAD";

static FULL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^refs/[^/]+/(.*)$").expect("ref pattern compiles"));

static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:").expect("scp pattern compiles")
});

/// Represents the source location of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Remote repository URL (git, HTTP(S), SSH)
    Remote(String),
    /// Local git working tree
    Local(PathBuf),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::Local(path) => {
                write!(f, "local path: '{}'", path.display())
            }
            TemplateSource::Remote(repo) => write!(f, "git repository: '{repo}'"),
        }
    }
}

impl TemplateSource {
    /// Classifies a location by its scheme; anything else is a local path.
    pub fn from_location(location: &str) -> Self {
        if is_remote_location(location) {
            Self::Remote(location.to_string())
        } else {
            Self::Local(PathBuf::from(location))
        }
    }
}

/// Whether `location` names a remote repository.
pub fn is_remote_location(location: &str) -> bool {
    if let Ok(url) = Url::parse(location) {
        if matches!(url.scheme(), "git" | "http" | "https" | "ssh") {
            return true;
        }
    }
    SCP_LIKE.is_match(location)
}

/// Reduces `refs/<kind>/<name>` to `<name>`; other refs are returned unchanged.
///
/// A shallow clone only accepts short branch or tag names.
pub fn branch_name(reference: &str) -> &str {
    match FULL_REF.captures(reference).and_then(|caps| caps.get(1)) {
        Some(name) => name.as_str(),
        None => reference,
    }
}

/// Builds a directory name for a snapshot from the last path segment of the
/// location, without `.git`, plus the ref with `/` replaced by `-`.
pub fn derive_local_dir_name(location: &str, reference: Option<&str>) -> String {
    let trimmed = location.trim_end_matches(|c: char| c == '/' || c == '\\');
    let base = trimmed.rsplit(|c: char| matches!(c, '/' | '\\' | ':')).next().unwrap_or(trimmed);
    let base = base.strip_suffix(".git").unwrap_or(base);

    match reference {
        Some(r) if !r.is_empty() => format!("{}-{}", base, r.replace('/', "-")),
        _ => base.to_string(),
    }
}

/// Whether `revision` is a full 40 character hexadecimal commit hash.
pub fn is_revision_hash(revision: &str) -> bool {
    revision.len() == 40 && revision.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Whether two origin locations name the same repository.
fn same_origin(cached: &str, wanted: &str) -> bool {
    let trim = |s: &str| s.trim().trim_end_matches(|c: char| c == '/' || c == '\\').to_string();
    trim(cached) == trim(wanted)
}

/// A template checked out at a known commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub revision: String,
}

/// Resolves template locations into snapshots under a cache directory.
pub struct Resolver<'a> {
    vcs: &'a dyn VersionControl,
    cache_dir: PathBuf,
}

impl<'a> Resolver<'a> {
    pub fn new<P: Into<PathBuf>>(vcs: &'a dyn VersionControl, cache_dir: P) -> Self {
        Self { vcs, cache_dir: cache_dir.into() }
    }

    /// Clones `location` into `destination`.
    ///
    /// Remote sources get a depth 1 clone of exactly `reference` (short name).
    /// Local sources are cloned in full and a new branch named `reference` is
    /// checked out.
    pub fn clone_repo(
        &self,
        location: &str,
        destination: &Path,
        reference: Option<&str>,
    ) -> Result<Snapshot> {
        let source = TemplateSource::from_location(location);
        info!("Cloning {} into '{}'", source, destination.display());

        match source {
            TemplateSource::Remote(url) => {
                let branch = reference.map(|r| branch_name(r).to_string());
                debug!("cloning branch name: {:?}", branch);
                self.vcs.clone_repo(&url, destination, &CloneSpec::Shallow { branch })?;
            }
            TemplateSource::Local(_) => {
                self.vcs.clone_repo(location, destination, &CloneSpec::Full)?;
                if let Some(reference) = reference {
                    self.vcs.checkout(destination, reference, true)?;
                }
            }
        }

        let revision = self.revision(destination)?;
        Ok(Snapshot { path: destination.to_path_buf(), revision })
    }

    /// Updates an existing clone to `reference` without cloning again.
    pub fn checkout_ref(&self, repo: &Path, reference: &str) -> Result<Snapshot> {
        info!("Updating '{}' to {}", repo.display(), reference);
        self.vcs.fetch(repo)?;
        self.vcs.checkout(repo, reference, false)?;

        let path = std::path::absolute(repo)?;
        let revision = self.revision(&path)?;
        Ok(Snapshot { path, revision })
    }

    /// Returns the highest version tag of a remote.
    ///
    /// # Errors
    /// * `Error::NoTagsFound` when the remote has no tags
    pub fn latest_tag(&self, location: &str) -> Result<String> {
        self.vcs
            .list_tags(location)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoTagsFound { location: location.to_string() })
    }

    /// Resolves a location into a cached snapshot, cloning on first use and
    /// moving the cached clone to the fetched upstream afterwards. Remote
    /// sources without a ref use their latest tag, or the default branch when
    /// there are no tags.
    ///
    /// A cached clone whose `origin` is not `location` is replaced.
    pub fn resolve(&self, location: &str, reference: Option<&str>) -> Result<Snapshot> {
        let source = TemplateSource::from_location(location);
        let reference = match reference {
            Some(r) => Some(r.to_string()),
            None if matches!(source, TemplateSource::Remote(_)) => {
                match self.latest_tag(location) {
                    Ok(tag) => Some(format!("refs/tags/{tag}")),
                    Err(Error::NoTagsFound { .. }) => {
                        debug!("No tags in '{}', using the default branch", location);
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        // local clones record an absolute origin so the cache can fetch from it
        let origin = match &source {
            TemplateSource::Remote(url) => url.clone(),
            TemplateSource::Local(path) => std::path::absolute(path)?.display().to_string(),
        };

        let dir_name = derive_local_dir_name(location, reference.as_deref());
        let destination = self.cache_dir.join(dir_name);
        if destination.join(VCS_DIR).exists() {
            let cached = self.vcs.remote_url(&destination)?;
            if same_origin(&cached, &origin) {
                debug!("Using cached snapshot '{}'", destination.display());
                return self.refresh(&destination, &source, reference.as_deref());
            }
            warn!(
                "Cached snapshot '{}' was cloned from '{}', cloning '{}' again",
                destination.display(),
                cached,
                origin
            );
            fs::remove_dir_all(&destination)?;
        }

        fs::create_dir_all(&self.cache_dir)?;
        self.clone_repo(&origin, &destination, reference.as_deref())
    }

    /// Fetches and moves a cached clone to the upstream state `reference` names.
    ///
    /// Tags are checked out by exact name. Branches of a remote follow
    /// `origin/<branch>`; local labels and ref-less clones follow `origin/HEAD`.
    fn refresh(
        &self,
        repo: &Path,
        source: &TemplateSource,
        reference: Option<&str>,
    ) -> Result<Snapshot> {
        if let Some(tag) = reference.filter(|r| r.starts_with("refs/tags/")) {
            return self.checkout_ref(repo, tag);
        }

        info!("Updating '{}' from its origin", repo.display());
        self.vcs.fetch(repo)?;
        match (source, reference) {
            (_, None) => self.vcs.checkout(repo, UPSTREAM_HEAD, false)?,
            (TemplateSource::Local(_), Some(label)) => {
                self.vcs.reset_branch(repo, label, UPSTREAM_HEAD)?
            }
            (TemplateSource::Remote(_), Some(reference)) => {
                let branch = branch_name(reference);
                let upstream = format!("origin/{branch}");
                match self.vcs.reset_branch(repo, branch, &upstream) {
                    Ok(()) => (),
                    // a short tag name has no remote-tracking branch
                    Err(Error::GitCommandError { .. }) => {
                        debug!("No '{}', checking out '{}' as is", upstream, reference);
                        self.vcs.checkout(repo, reference, false)?
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let path = std::path::absolute(repo)?;
        let revision = self.revision(&path)?;
        Ok(Snapshot { path, revision })
    }

    fn revision(&self, repo: &Path) -> Result<String> {
        let revision = self.vcs.head_revision(repo)?;
        if !is_revision_hash(&revision) {
            return Err(Error::InvalidRevision { revision });
        }
        Ok(revision)
    }
}
