//! Drives the flattener at two snapshots and renders the difference.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec;
use crate::flatten::Flattener;
use crate::rcs::{RepoLocation, SnapshotId, SnapshotSource};
use crate::util;

/// The three files a comparison produces. The caller decides what to keep.
#[derive(Debug, Clone)]
pub struct DiffArtifact {
    pub diff_path: PathBuf,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

pub struct DiffOptions {
    /// Extra arguments forwarded verbatim to latexdiff.
    pub latexdiff_args: Vec<String>,
    pub strip_comments: bool,
    pub timeout: Duration,
}

/// Flatten `filename` at both snapshots, persist the flat texts next to
/// `output`, and render their latexdiff into `output`.
///
/// Stateless pipeline; any failure propagates immediately and no retry is
/// attempted.
pub fn compare(
    source: &dyn SnapshotSource,
    location: &RepoLocation,
    old: &SnapshotId,
    new: &SnapshotId,
    filename: &str,
    output: &Path,
    opts: &DiffOptions,
) -> Result<DiffArtifact> {
    let flattener = Flattener::new(source, location).strip_comments(opts.strip_comments);

    tracing::info!(snapshot = %old, "flatten old snapshot");
    let old_content = flattener.flatten(old, filename)?;
    tracing::info!(snapshot = %new, "flatten new snapshot");
    let new_content = flattener.flatten(new, filename)?;

    // Siblings of the diff output, so relative figure paths keep resolving
    // if the diff is compiled later.
    let old_path = util::append_suffix(output, ".old");
    let new_path = util::append_suffix(output, ".new");
    util::write_file(&old_path, &old_content)?;
    util::write_file(&new_path, &new_content)?;

    tracing::info!("execute latexdiff");
    let mut args = opts.latexdiff_args.clone();
    args.push(old_path.to_string_lossy().into_owned());
    args.push(new_path.to_string_lossy().into_owned());
    let rendered = exec::run("latexdiff", args, None, opts.timeout)?;
    if !rendered.success() {
        if rendered.timed_out {
            return Err(anyhow!("latexdiff timed out"));
        }
        return Err(anyhow!(
            "latexdiff failed (exit {:?}): {}",
            rendered.exit_code,
            rendered.stderr_utf8().trim()
        ));
    }
    // latexdiff may emit whatever encoding the inputs and --encoding imply;
    // its bytes are written verbatim.
    util::write_bytes(output, &rendered.stdout)?;

    Ok(DiffArtifact {
        diff_path: output.to_path_buf(),
        old_path,
        new_path,
    })
}
