//! `VersionControl` backed by the `git` command-line tool.
use crate::error::{Error, Result};
use crate::loader::interface::{CloneSpec, VersionControl};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

static REMOTE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[a-f0-9]+\s+refs/tags/(\S+?)(\^\{\})?$").expect("tag pattern compiles")
});

/// Runs git as a subprocess.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self { program: PathBuf::from("git") }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific git executable instead of the one on `PATH`.
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self { program: program.into() }
    }

    /// Runs git with `args` in `dir` and returns its combined stdout and stderr.
    ///
    /// # Errors
    /// * `Error::GitLaunchError` if git cannot be started
    /// * `Error::GitCommandError` on a non-zero exit, carrying the captured output
    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<String> {
        let joined = args.join(" ");
        debug!("Running git {}", joined);

        let mut cmd = Command::new(&self.program);
        cmd.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd
            .output()
            .map_err(|source| Error::GitLaunchError { args: joined.clone(), source })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(Error::GitCommandError {
                args: joined,
                code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }
        Ok(combined)
    }
}

impl VersionControl for GitCli {
    fn clone_repo(&self, location: &str, destination: &Path, spec: &CloneSpec) -> Result<()> {
        let destination = destination.to_string_lossy();
        let mut args = vec!["clone"];
        if let CloneSpec::Shallow { branch } = spec {
            args.extend(["--depth", "1"]);
            if let Some(branch) = branch {
                args.extend(["--branch", branch.as_str()]);
            }
        }
        args.extend([location, &*destination]);
        let out = self.run(None, &args)?;
        debug!("clone output\n{}", out);
        Ok(())
    }

    fn fetch(&self, repo: &Path) -> Result<()> {
        self.run(Some(repo), &["fetch", "--all", "-p"]).map(|_| ())
    }

    fn checkout(&self, repo: &Path, reference: &str, create_branch: bool) -> Result<()> {
        let args: Vec<&str> = if create_branch {
            vec!["checkout", "-b", reference]
        } else {
            vec!["checkout", reference]
        };
        self.run(Some(repo), &args).map(|_| ())
    }

    fn reset_branch(&self, repo: &Path, branch: &str, start_point: &str) -> Result<()> {
        self.run(Some(repo), &["checkout", "-B", branch, start_point]).map(|_| ())
    }

    fn remote_url(&self, repo: &Path) -> Result<String> {
        let out = self.run(Some(repo), &["remote", "get-url", "origin"])?;
        Ok(out.trim().to_string())
    }

    fn list_tags(&self, location: &str) -> Result<Vec<String>> {
        let out = self.run(None, &["ls-remote", "--sort=-version:refname", "--tags", location])?;
        Ok(parse_remote_tags(&out))
    }

    fn head_revision(&self, repo: &Path) -> Result<String> {
        let out = self.run(Some(repo), &["rev-parse", "HEAD"])?;
        Ok(out.trim().to_string())
    }
}

/// Extracts tag names from `git ls-remote --tags` output, keeping their order.
/// Peeled entries (`tag^{}`) collapse into the tag they belong to.
pub fn parse_remote_tags(output: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in REMOTE_TAG.captures_iter(output) {
        let tag = &caps[1];
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
