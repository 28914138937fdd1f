//! Commit object store
//!
//! This module defines the commit identity types the todo list refers to, the
//! `CommitResolver` seam used when parsing todo lines, and a `Repository` that
//! answers those lookups by shelling out to `git`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of hex digits shown for an abbreviated object id
pub const SHORT_OID_LEN: usize = 7;

/// Message used for the commit wrapping the staged changes
pub const INDEX_COMMIT_MESSAGE: &str = "<git index>";

/// Errors raised by the object store
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("unknown commit '{0}'")]
    UnknownCommit(String),

    #[error("invalid object id '{0}'")]
    InvalidOid(String),

    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },

    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
}

/// A full hexadecimal object id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Oid(String);

impl Oid {
    /// Returns the full hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form shown in todo lines
    pub fn short(&self) -> &str {
        // Oids are ascii hex, so slicing on a byte index is safe
        &self.0[..self.0.len().min(SHORT_OID_LEN)]
    }
}

impl FromStr for Oid {
    type Err = OdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(OdbError::InvalidOid(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A commit as seen by the todo list: its identity and a one-line summary.
///
/// Two commits are equal when their object ids are equal; the summary is
/// display-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    oid: Oid,
    summary: String,
}

impl Commit {
    /// Creates a commit reference from an id and its summary line
    pub fn new(oid: Oid, summary: impl Into<String>) -> Self {
        Self {
            oid,
            summary: summary.into(),
        }
    }

    /// Gets the object id
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Gets the abbreviated object id
    pub fn short_id(&self) -> &str {
        self.oid.short()
    }

    /// Gets the first line of the commit message
    pub fn summary_line(&self) -> &str {
        &self.summary
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for Commit {}

impl std::hash::Hash for Commit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.oid.hash(state);
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.short_id(), self.summary)
    }
}

/// Resolves a hash-like token typed into a todo line to a commit
pub trait CommitResolver {
    /// Looks up `token`, failing with `OdbError::UnknownCommit` when nothing matches
    fn resolve(&self, token: &str) -> Result<Commit, OdbError>;
}

impl<T: CommitResolver + ?Sized> CommitResolver for &T {
    fn resolve(&self, token: &str) -> Result<Commit, OdbError> {
        (**self).resolve(token)
    }
}

/// A git repository, accessed through `git` subprocess calls in a working directory.
#[derive(Debug, Clone)]
pub struct Repository {
    workdir: PathBuf,
    git_dir: PathBuf,
}

impl Repository {
    /// Opens the repository containing `dir`
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        let workdir = dir.as_ref().to_path_buf();
        let out = run_capture(&workdir, &["rev-parse", "--absolute-git-dir"])?;
        let git_dir = PathBuf::from(out.trim());
        debug!(git_dir = %git_dir.display(), "opened repository");
        Ok(Self { workdir, git_dir })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Lists the commits reachable from `head` but not from `base`, oldest first.
    #[instrument(skip(self))]
    pub fn commits_between(&self, base: &str, head: &str) -> Result<Vec<Commit>, OdbError> {
        let base = self.resolve(base)?;
        let head = self.resolve(head)?;
        let range = format!("{}..{}", base.oid(), head.oid());
        let out = self.run_capture(&["rev-list", "--reverse", &range])?;

        let mut commits = Vec::new();
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            let oid: Oid = line.parse()?;
            let summary = self.summary_of(&oid)?;
            commits.push(Commit::new(oid, summary));
        }
        debug!(count = commits.len(), "listed commits");
        Ok(commits)
    }

    /// Wraps the staged changes in a commit on top of `HEAD`.
    ///
    /// Returns `None` when nothing is staged.
    #[instrument(skip(self))]
    pub fn index_commit(&self) -> Result<Option<Commit>, OdbError> {
        // `diff --cached --quiet` exits 1 when the index differs from HEAD
        if self.run_unless_one(&["diff", "--cached", "--quiet"])?.is_some() {
            debug!("index matches HEAD");
            return Ok(None);
        }

        let tree = self.run_capture(&["write-tree"])?;
        let head = self.resolve("HEAD")?;
        let out = self.run_capture(&[
            "commit-tree",
            tree.trim(),
            "-p",
            head.oid().as_str(),
            "-m",
            INDEX_COMMIT_MESSAGE,
        ])?;
        let oid: Oid = out.parse()?;
        debug!(%oid, "created index commit");
        Ok(Some(Commit::new(oid, INDEX_COMMIT_MESSAGE)))
    }

    /// Reads a git config value, `None` if the key is unset
    pub fn config_value(&self, key: &str) -> Result<Option<String>, OdbError> {
        // exit status 1 means the key is missing
        let Some(output) = self.run_unless_one(&["config", "--get", key])? else {
            return Ok(None);
        };
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    fn summary_of(&self, oid: &Oid) -> Result<String, OdbError> {
        let out = self.run_capture(&["log", "-1", "--format=%s", oid.as_str()])?;
        Ok(out.trim_end().to_string())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String, OdbError> {
        run_capture(&self.workdir, args)
    }

    fn run(&self, args: &[&str]) -> Result<Output, OdbError> {
        run(&self.workdir, args)
    }

    /// Runs git, mapping exit status 1 to `None`. Any other failure is an error.
    fn run_unless_one(&self, args: &[&str]) -> Result<Option<Output>, OdbError> {
        let output = self.run(args)?;
        match output.status.code() {
            Some(0) => Ok(Some(output)),
            Some(1) => Ok(None),
            _ => Err(git_error(args, &output)),
        }
    }
}

impl CommitResolver for Repository {
    fn resolve(&self, token: &str) -> Result<Commit, OdbError> {
        let rev = format!("{token}^{{commit}}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &rev])?;
        if !output.status.success() {
            return Err(OdbError::UnknownCommit(token.to_string()));
        }
        let oid: Oid = String::from_utf8_lossy(&output.stdout).parse()?;
        let summary = self.summary_of(&oid)?;
        Ok(Commit::new(oid, summary))
    }
}

fn run_capture(workdir: &Path, args: &[&str]) -> Result<String, OdbError> {
    let output = run(workdir, args)?;
    if !output.status.success() {
        return Err(git_error(args, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn git_error(args: &[&str], output: &Output) -> OdbError {
    OdbError::Git {
        args: args.join(" "),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn run(workdir: &Path, args: &[&str]) -> Result<Output, OdbError> {
    debug!(args = %args.join(" "), "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .output()?;
    Ok(output)
}
