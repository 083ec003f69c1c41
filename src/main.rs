use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;
mod diff;
mod exec;
mod flatten;
mod pdf;
mod rcs;
mod tex;
mod util;

use cli::Args;
use diff::{DiffArtifact, DiffOptions};
use rcs::SnapshotId;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    // latexdiff is the one external tool without which the whole run is
    // pointless, so its absence is checked before any other work.
    if which::which("latexdiff").is_err() {
        bail!(
            "latexdiff not found in PATH\n\
             Install it or correct your PATH, e.g.:\n\
             \x20 apt-get install latexdiff\n\
             \x20 sudo port install latexdiff"
        );
    }

    let timeout = Duration::from_secs(args.timeout);
    let start_dir = args
        .file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let source = rcs::detect_backend(start_dir, timeout).ok_or_else(|| {
        anyhow!(
            "no revision-control repository found at {}",
            start_dir.display()
        )
    })?;
    tracing::info!(backend = source.name(), "detected repository");

    let (location, filename) = source.resolve_paths(&args.file)?;
    tracing::info!(root = %location.root.display(), "root path of the repository");
    if location.relative_dir.as_os_str().is_empty() {
        tracing::info!(filename = %filename, "resolved document");
    } else {
        tracing::info!(relative = %location.relative_dir.display(), filename = %filename, "resolved document");
    }

    let old = SnapshotId::Rev(args.old.clone());
    let new = match &args.new {
        Some(rev) => SnapshotId::Rev(rev.clone()),
        None => SnapshotId::WorkingCopy,
    };
    for snapshot in [&old, &new] {
        if !source.is_commit(&location.root, snapshot)? {
            bail!("snapshot does not exist: {snapshot}");
        }
    }

    // Absolute so the later pdflatex run, which changes directory into the
    // document source, still finds the diff and its siblings.
    let output = match &args.output {
        Some(path) => util::absolutize(path).context("resolve --output")?,
        None => location
            .root
            .join(&location.relative_dir)
            .join("diff.tex"),
    };

    let latexdiff_args = match &args.latexdiff_opts {
        Some(raw) => shell_words::split(raw).context("parse --latexdiff-opts")?,
        None => Vec::new(),
    };
    let opts = DiffOptions {
        latexdiff_args,
        strip_comments: args.strip_comments,
        timeout,
    };
    let artifact = diff::compare(
        source.as_ref(),
        &location,
        &old,
        &new,
        &filename,
        &output,
        &opts,
    )?;
    println!("Wrote diff to {}", artifact.diff_path.display());

    // The diff above is the real product; pdf build and viewer launch are
    // conveniences and never fail the run.
    let mut pdf_path = None;
    if !args.no_pdf {
        let source_dir = location.root.join(&location.relative_dir);
        match pdf::build_pdf(&artifact.diff_path, &source_dir, timeout) {
            Ok(path) => {
                println!("Built {}", path.display());
                pdf_path = Some(path);
            }
            Err(err) => tracing::warn!(%err, "pdf build failed; the diff file is still valid"),
        }
    }
    if let Some(pdf_path) = &pdf_path {
        if !args.no_open {
            if let Err(err) = pdf::open_pdf(pdf_path, timeout) {
                tracing::warn!(%err, "could not open pdf viewer");
            }
        }
    }

    if args.clean {
        util::clean_files(&cleanup_candidates(&artifact, pdf_path.is_some()));
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Everything `--clean` may remove. Keeps the PDF when one was built,
/// otherwise keeps the diff source itself.
fn cleanup_candidates(artifact: &DiffArtifact, built_pdf: bool) -> Vec<PathBuf> {
    let mut files = vec![artifact.old_path.clone(), artifact.new_path.clone()];
    for ext in ["aux", "log", "out", "bbl", "blg"] {
        files.push(artifact.diff_path.with_extension(ext));
    }
    if built_pdf {
        files.push(artifact.diff_path.clone());
    }
    files.retain(|path| path.exists());
    files
}
