//! Revision-control backends behind the [`SnapshotSource`] trait.
//!
//! A backend answers one question the flattener cares about: what did file F
//! look like at snapshot S? Everything else (repository detection, snapshot
//! validation, path decomposition) exists so the CLI can fail early with a
//! clear message instead of producing a half-empty diff.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec;

/// A point-in-time version of the tracked tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotId {
    /// Current on-disk state, including uncommitted edits.
    WorkingCopy,
    /// A commit hash, branch, tag, or revision number.
    Rev(String),
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotId::WorkingCopy => write!(f, "working copy"),
            SnapshotId::Rev(rev) => write!(f, "{rev}"),
        }
    }
}

/// Where the compared document lives relative to the detected repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub root: PathBuf,
    /// Directory of the document within `root`. Include targets always
    /// resolve against this same directory.
    pub relative_dir: PathBuf,
}

pub trait SnapshotSource {
    fn name(&self) -> &'static str;

    /// Content of `relative_file` at `snapshot`, read from disk for the
    /// working copy. Empty string when the file does not exist at that
    /// snapshot; that is a valid answer, not an error.
    fn show_file(&self, root: &Path, snapshot: &SnapshotId, relative_file: &Path)
        -> Result<String>;

    fn is_valid_directory(&self, path: &Path) -> bool;

    /// Whether `snapshot` resolves to a real revision. The working copy is
    /// always valid.
    fn is_commit(&self, root: &Path, snapshot: &SnapshotId) -> Result<bool>;

    /// Decompose `file` into the repository root, the directory of the file
    /// within the root, and the bare filename.
    fn resolve_paths(&self, file: &Path) -> Result<(RepoLocation, String)>;
}

/// Probe known backends in order and return the first that claims `path`.
pub fn detect_backend(path: &Path, timeout: Duration) -> Option<Box<dyn SnapshotSource>> {
    let candidates: Vec<Box<dyn SnapshotSource>> =
        vec![Box::new(Git::new(timeout)), Box::new(Svn::new(timeout))];
    candidates
        .into_iter()
        .find(|backend| backend.is_valid_directory(path))
}

fn read_working_copy(root: &Path, relative_file: &Path) -> Result<String> {
    let path = root.join(relative_file);
    if !path.exists() {
        return Ok(String::new());
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    Ok(content.trim().to_string())
}

fn parent_dir(file: &Path) -> &Path {
    file.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

pub struct Git {
    timeout: Duration,
}

impl Git {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn git(&self, cwd: &Path, args: &[&str]) -> Result<exec::ExecOutput> {
        exec::run("git", args, Some(cwd), self.timeout)
    }
}

impl SnapshotSource for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn show_file(
        &self,
        root: &Path,
        snapshot: &SnapshotId,
        relative_file: &Path,
    ) -> Result<String> {
        let rev = match snapshot {
            SnapshotId::WorkingCopy => return read_working_copy(root, relative_file),
            SnapshotId::Rev(rev) => rev,
        };
        let spec = format!("{rev}:{}", relative_file.to_string_lossy());
        let output = self.git(root, &["show", &spec])?;
        if !output.success() {
            // File absent at this snapshot.
            return Ok(String::new());
        }
        let content = String::from_utf8(output.stdout).map_err(|_| {
            anyhow!(
                "{} at {rev} is not valid UTF-8; re-encode it before diffing",
                relative_file.display()
            )
        })?;
        Ok(content.trim().to_string())
    }

    fn is_valid_directory(&self, path: &Path) -> bool {
        self.git(path, &["rev-parse", "--is-inside-work-tree"])
            .map(|output| output.success())
            .unwrap_or(false)
    }

    fn is_commit(&self, root: &Path, snapshot: &SnapshotId) -> Result<bool> {
        let rev = match snapshot {
            SnapshotId::WorkingCopy => return Ok(true),
            SnapshotId::Rev(rev) => rev,
        };
        let spec = format!("{rev}^{{commit}}");
        let output = self.git(root, &["rev-parse", "--verify", "--quiet", &spec])?;
        Ok(output.success())
    }

    fn resolve_paths(&self, file: &Path) -> Result<(RepoLocation, String)> {
        let dir = parent_dir(file);
        let output = self.git(dir, &["rev-parse", "--show-toplevel"])?;
        if !output.success() {
            return Err(anyhow!(
                "{} is not inside a git repository",
                file.display()
            ));
        }
        let root = PathBuf::from(output.stdout_utf8().trim());

        let absolute_dir = dir
            .canonicalize()
            .with_context(|| format!("resolve {}", dir.display()))?;
        let relative_dir = absolute_dir
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let filename = file
            .file_name()
            .ok_or_else(|| anyhow!("{} has no filename", file.display()))?
            .to_string_lossy()
            .into_owned();

        Ok((RepoLocation { root, relative_dir }, filename))
    }
}

pub struct Svn {
    timeout: Duration,
}

impl Svn {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn svn(&self, cwd: &Path, args: &[&str]) -> Result<exec::ExecOutput> {
        exec::run("svn", args, Some(cwd), self.timeout)
    }
}

impl SnapshotSource for Svn {
    fn name(&self) -> &'static str {
        "svn"
    }

    fn show_file(
        &self,
        root: &Path,
        snapshot: &SnapshotId,
        relative_file: &Path,
    ) -> Result<String> {
        let rev = match snapshot {
            SnapshotId::WorkingCopy => return read_working_copy(root, relative_file),
            SnapshotId::Rev(rev) => rev,
        };
        let relative = relative_file.to_string_lossy();
        let output = self.svn(root, &["cat", "-r", rev, &relative])?;
        if !output.success() {
            return Ok(String::new());
        }
        let content = String::from_utf8(output.stdout).map_err(|_| {
            anyhow!(
                "{} at {rev} is not valid UTF-8; re-encode it before diffing",
                relative_file.display()
            )
        })?;
        Ok(content.trim().to_string())
    }

    fn is_valid_directory(&self, path: &Path) -> bool {
        self.svn(path, &["info"])
            .map(|output| output.success())
            .unwrap_or(false)
    }

    fn is_commit(&self, root: &Path, snapshot: &SnapshotId) -> Result<bool> {
        let rev = match snapshot {
            SnapshotId::WorkingCopy => return Ok(true),
            SnapshotId::Rev(rev) => rev,
        };
        let output = self.svn(root, &["info", "-r", rev])?;
        Ok(output.success())
    }

    fn resolve_paths(&self, file: &Path) -> Result<(RepoLocation, String)> {
        // svn commands accept working-copy paths anywhere below the
        // checkout, so the file's own directory serves as the root.
        let root = parent_dir(file)
            .canonicalize()
            .with_context(|| format!("resolve {}", file.display()))?;
        let filename = file
            .file_name()
            .ok_or_else(|| anyhow!("{} has no filename", file.display()))?
            .to_string_lossy()
            .into_owned();

        Ok((
            RepoLocation {
                root,
                relative_dir: PathBuf::new(),
            },
            filename,
        ))
    }
}
