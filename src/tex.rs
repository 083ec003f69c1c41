//! Textual handling of LaTeX sources: inclusion directives and comments.
//!
//! The tool never parses LaTeX proper. Includes are located as opaque
//! `\input{...}` / `\include{...}` occurrences and everything else passes
//! through untouched.

use regex::Regex;

/// One `\input{...}` or `\include{...}` occurrence in a scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Byte range of the full directive text within the scanned content.
    pub start: usize,
    pub end: usize,
    /// Target name as written between the braces.
    pub target: String,
}

/// Locate every inclusion directive, left to right.
///
/// Matching stops at the first closing brace, so several directives on one
/// line are found as separate occurrences.
pub fn find_includes(content: &str) -> Vec<IncludeDirective> {
    let re = Regex::new(r"\\(?:input|include)\{([^}]*)\}").expect("regex for include directives");
    re.captures_iter(content)
        .map(|cap| {
            let whole = cap.get(0).expect("whole match");
            let target = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            IncludeDirective {
                start: whole.start(),
                end: whole.end(),
                target: target.to_string(),
            }
        })
        .collect()
}

/// Append the default `.tex` extension to bare include names.
pub fn with_tex_extension(name: &str) -> String {
    if name.ends_with(".tex") {
        name.to_string()
    } else {
        format!("{name}.tex")
    }
}

/// Remove LaTeX comments from `content`.
///
/// Lines holding only a comment disappear entirely, including their
/// newline. A `%` after real content truncates the line from the `%` on.
/// An escaped `\%` is literal and never starts a comment.
pub fn strip_comments(content: &str) -> String {
    let comment_line =
        Regex::new(r"(?m)^[ \t]*%.*\r?\n").expect("regex for comment-only lines");
    let inline_comment =
        Regex::new(r"(?m)(^|[^\\])%.*").expect("regex for trailing comments");

    let without_lines = comment_line.replace_all(content, "");
    inline_comment.replace_all(&without_lines, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_directives_in_order_with_spans() {
        let content = "intro\n\\input{alpha}\nmiddle \\include{beta.tex} end\n";
        let found = find_includes(content);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].target, "alpha");
        assert_eq!(&content[found[0].start..found[0].end], "\\input{alpha}");
        assert_eq!(found[1].target, "beta.tex");
        assert_eq!(&content[found[1].start..found[1].end], "\\include{beta.tex}");
        assert!(found[0].start < found[1].start);
    }

    #[test]
    fn two_directives_on_one_line_are_separate() {
        let content = "\\input{a}\\input{b}";
        let found = find_includes(content);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].target, "a");
        assert_eq!(found[1].target, "b");
    }

    #[test]
    fn ignores_text_without_directives() {
        assert!(find_includes("just prose with a \\textbf{brace}").is_empty());
    }

    #[test]
    fn appends_default_extension_to_bare_names() {
        assert_eq!(with_tex_extension("chapter1"), "chapter1.tex");
        assert_eq!(with_tex_extension("chapter1.tex"), "chapter1.tex");
    }

    #[test]
    fn strips_comments_per_reference_example() {
        let input =
            "Lorem ipsum 1\n% lorem ipsum 2\nlorem ipsum 3 % lorem ipsum\n\\% lorem ipsum 4\nlorem ipsum 5\n";
        let expected = "Lorem ipsum 1\nlorem ipsum 3 \n\\% lorem ipsum 4\nlorem ipsum 5\n";
        assert_eq!(strip_comments(input), expected);
    }

    #[test]
    fn strips_comment_only_line_with_leading_whitespace() {
        assert_eq!(strip_comments("a\n  % note\nb\n"), "a\nb\n");
    }

    #[test]
    fn keeps_escaped_percent_mid_line() {
        assert_eq!(strip_comments("50\\% of cases\n"), "50\\% of cases\n");
    }

    #[test]
    fn truncates_final_line_without_newline() {
        assert_eq!(strip_comments("value % trailing"), "value ");
    }
}
