//! Optional compilation of the rendered diff into a PDF, and viewing it.
//!
//! pdflatex exits nonzero on recoverable warnings, so individual run
//! failures are only logged; what matters is whether a PDF exists at the
//! end. Callers treat any error here as a warning, never as a reason to
//! discard the diff.

use anyhow::{anyhow, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec;

/// Build `<stem>.pdf` from the diff, running from `source_dir` so relative
/// figure and asset paths resolve as they would for the original document.
pub fn build_pdf(diff_path: &Path, source_dir: &Path, timeout: Duration) -> Result<PathBuf> {
    let output_dir = diff_path.parent().unwrap_or(Path::new("."));
    let aux_path = diff_path.with_extension("aux");
    let pdf_path = diff_path.with_extension("pdf");

    let pdflatex = |label: &str| {
        let args: Vec<&OsStr> = vec![
            OsStr::new("-interaction"),
            OsStr::new("nonstopmode"),
            OsStr::new("-output-directory"),
            output_dir.as_os_str(),
            diff_path.as_os_str(),
        ];
        let result = exec::run("pdflatex", args, Some(source_dir), timeout);
        match result {
            Ok(output) if !output.success() => {
                tracing::debug!(label, code = ?output.exit_code, "pdflatex run did not succeed")
            }
            Ok(_) => {}
            Err(err) => tracing::debug!(label, %err, "pdflatex run failed"),
        }
    };

    // Two passes, bibtex if an .aux appeared, two more passes to settle
    // references.
    pdflatex("first");
    pdflatex("second");
    if aux_path.is_file() {
        let bibtex = exec::run("bibtex", [aux_path.as_os_str()], Some(source_dir), timeout);
        if let Err(err) = bibtex {
            tracing::debug!(%err, "bibtex run failed");
        }
    }
    pdflatex("third");
    pdflatex("fourth");

    if !pdf_path.is_file() {
        return Err(anyhow!("pdflatex produced no {}", pdf_path.display()));
    }
    Ok(pdf_path)
}

/// Hand the PDF to the platform opener.
pub fn open_pdf(pdf_path: &Path, timeout: Duration) -> Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    let output = exec::run(opener, [pdf_path.as_os_str()], None, timeout)?;
    if !output.success() {
        return Err(anyhow!(
            "{opener} failed (exit {:?})",
            output.exit_code
        ));
    }
    Ok(())
}
