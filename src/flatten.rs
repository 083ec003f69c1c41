//! Recursive snapshot-aware document flattening.
//!
//! A document tree is expanded depth-first: every `\input`/`\include`
//! directive is replaced by the included file's own flattened content,
//! bracketed by provenance markers so a downstream line diff can attribute
//! changed lines to the file they came from. Each snapshot is flattened
//! independently; nothing is cached across snapshots.

use anyhow::Result;
use std::fmt;

use crate::rcs::{RepoLocation, SnapshotId, SnapshotSource};
use crate::tex;

/// The include graph reached back into a file still being expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicIncludeError {
    /// Include chain from the root document to the repeated file.
    pub chain: Vec<String>,
}

impl fmt::Display for CyclicIncludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyclic include: {}", self.chain.join(" -> "))
    }
}

impl std::error::Error for CyclicIncludeError {}

pub struct Flattener<'a> {
    source: &'a dyn SnapshotSource,
    location: &'a RepoLocation,
    strip_comments: bool,
}

impl<'a> Flattener<'a> {
    pub fn new(source: &'a dyn SnapshotSource, location: &'a RepoLocation) -> Self {
        Self {
            source,
            location,
            strip_comments: false,
        }
    }

    /// Strip LaTeX comments from every fetched file before scanning it, so
    /// commented-out directives are not expanded.
    pub fn strip_comments(mut self, strip: bool) -> Self {
        self.strip_comments = strip;
        self
    }

    /// Fully expanded content of `filename` at `snapshot`.
    ///
    /// A file missing at the snapshot flattens to an empty block between
    /// its provenance markers. Cycles fail with [`CyclicIncludeError`].
    pub fn flatten(&self, snapshot: &SnapshotId, filename: &str) -> Result<String> {
        let mut stack = Vec::new();
        self.flatten_inner(snapshot, filename, &mut stack)
    }

    fn flatten_inner(
        &self,
        snapshot: &SnapshotId,
        filename: &str,
        stack: &mut Vec<String>,
    ) -> Result<String> {
        if stack.iter().any(|seen| seen == filename) {
            let mut chain = stack.clone();
            chain.push(filename.to_string());
            return Err(CyclicIncludeError { chain }.into());
        }
        stack.push(filename.to_string());

        tracing::info!(snapshot = %snapshot, filename, "get file");
        let relative_file = self.location.relative_dir.join(filename);
        let mut content =
            self.source
                .show_file(&self.location.root, snapshot, &relative_file)?;
        if self.strip_comments {
            content = tex::strip_comments(&content);
        }

        // Splice by occurrence position, in order of appearance. Two
        // textually identical directives stay distinct expansion points.
        let directives = tex::find_includes(&content);
        let mut expanded = String::with_capacity(content.len());
        let mut cursor = 0;
        for directive in &directives {
            let target = tex::with_tex_extension(&directive.target);
            let inlined = self.flatten_inner(snapshot, &target, stack)?;
            expanded.push_str(&content[cursor..directive.start]);
            expanded.push_str(&format!(
                "%% Input {target}\n{inlined}\n%% End of Input {target}"
            ));
            cursor = directive.end;
        }
        expanded.push_str(&content[cursor..]);

        stack.pop();
        Ok(expanded)
    }
}
