//! CLI argument parsing.
//!
//! The CLI is intentionally thin: it names snapshots and files and picks
//! outputs; all flattening and diffing policy lives in the core modules.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ltxdiff",
    version,
    about = "Render a latexdiff between two revision-control snapshots of a LaTeX file",
    after_help = "Examples:\n  ltxdiff paper.tex HEAD~1\n  ltxdiff paper.tex v1.0 v2.0 -o revisions.tex\n  ltxdiff paper.tex 1450 1512 --no-pdf --latexdiff-opts \"--encoding=utf8\"\n  ltxdiff paper.tex HEAD~3 --clean"
)]
pub struct Args {
    /// LaTeX file to compare
    pub file: PathBuf,

    /// Old snapshot (commit hash, branch, tag, or revision number)
    pub old: String,

    /// New snapshot; defaults to the current working copy
    pub new: Option<String>,

    /// Output path for the rendered diff (default: diff.tex next to FILE)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Show progress messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Show debug messages, including every external command
    #[arg(short = 'D', long, conflicts_with = "verbose")]
    pub debug: bool,

    /// Don't try to run pdflatex on the diff file
    #[arg(long)]
    pub no_pdf: bool,

    /// Don't try to open the created PDF file
    #[arg(long)]
    pub no_open: bool,

    /// Remove all intermediate files, keeping only the final artifact
    #[arg(long)]
    pub clean: bool,

    /// Strip LaTeX comments from fetched content before expanding includes
    #[arg(long)]
    pub strip_comments: bool,

    /// Extra options passed through to latexdiff (e.g. "--encoding=utf8")
    #[arg(long, value_name = "OPTS", allow_hyphen_values = true)]
    pub latexdiff_opts: Option<String>,

    /// Timeout in seconds for each external command
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_is_optional() {
        let args = Args::parse_from(["ltxdiff", "paper.tex", "HEAD~1"]);
        assert_eq!(args.old, "HEAD~1");
        assert!(args.new.is_none());
        assert!(!args.no_pdf);
        assert_eq!(args.timeout, 300);
    }

    #[test]
    fn accepts_two_snapshots_and_flags() {
        let args = Args::parse_from([
            "ltxdiff",
            "paper.tex",
            "v1.0",
            "v2.0",
            "-o",
            "out.tex",
            "--no-pdf",
            "--clean",
            "--latexdiff-opts",
            "--encoding=utf8",
        ]);
        assert_eq!(args.new.as_deref(), Some("v2.0"));
        assert_eq!(args.output, Some(PathBuf::from("out.tex")));
        assert!(args.no_pdf);
        assert!(args.clean);
        assert_eq!(args.latexdiff_opts.as_deref(), Some("--encoding=utf8"));
    }

    #[test]
    fn verbose_and_debug_conflict() {
        assert!(Args::try_parse_from(["ltxdiff", "paper.tex", "HEAD", "-v", "-D"]).is_err());
    }
}
