use crate::error::Result;
use std::path::Path;

/// How a repository is cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneSpec {
    /// Single revision, depth 1; `branch` must be a short branch or tag name.
    Shallow { branch: Option<String> },
    /// Complete history.
    Full,
}

/// Version-control operations the resolver relies on.
///
/// Every call blocks until the underlying tool finishes; a non-zero exit is
/// always an error.
pub trait VersionControl {
    fn clone_repo(&self, location: &str, destination: &Path, spec: &CloneSpec) -> Result<()>;

    /// Fetches every remote, pruning deleted refs.
    fn fetch(&self, repo: &Path) -> Result<()>;

    /// Checks out `reference`; with `create_branch` a new local branch of that name is made.
    fn checkout(&self, repo: &Path, reference: &str, create_branch: bool) -> Result<()>;

    /// Points branch `branch` at `start_point` and checks it out, creating it if needed.
    fn reset_branch(&self, repo: &Path, branch: &str, start_point: &str) -> Result<()>;

    /// The URL or path the `origin` remote of `repo` was cloned from.
    fn remote_url(&self, repo: &Path) -> Result<String>;

    /// Tag names of a remote, highest version first.
    fn list_tags(&self, location: &str) -> Result<Vec<String>>;

    /// The commit hash `HEAD` points to.
    fn head_revision(&self, repo: &Path) -> Result<String>;
}
