use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    write_bytes(path, content.as_bytes())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    tracing::debug!(path = %path.display(), "write file");
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Absolute form of `path` without requiring it to exist yet: the parent is
/// canonicalized, the filename appended as-is.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("{} has no filename", path.display()))?;
    let parent = parent
        .canonicalize()
        .with_context(|| format!("resolve {}", parent.display()))?;
    Ok(parent.join(file_name))
}

/// `diff.tex` + `.old` -> `diff.tex.old`, as a sibling of the original.
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(suffix);
    path.with_file_name(name)
}

/// Best-effort removal: a file that cannot be removed is logged and skipped.
pub fn clean_files(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed file"),
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "could not remove file")
            }
        }
    }
}
