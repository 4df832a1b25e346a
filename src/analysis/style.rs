//! Documentation-update check and a placeholder lint.

const DOCS_UPDATED: &str = "Documentation files were updated.";
const DOCS_MISSING: &str =
    "No documentation updates detected. Consider reviewing the docs to ensure they reflect the new changes.";
const NO_LINT_ISSUES: &str = "No linting issues found.";

/// Calls that usually mean leftover debugging output.
const DEBUG_PRINT_MARKERS: &[&str] = &["print(", "println!(", "dbg!(", "console.log("];

/// Given a newline-separated changed-file list, report whether any
/// documentation file was touched.
pub fn check_documentation_updates(changed_files: &str) -> String {
    let touched_docs = changed_files
        .lines()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .any(|f| {
            let lower = f.to_lowercase();
            lower.contains("readme") || lower.contains("docs")
        });

    if touched_docs {
        DOCS_UPDATED.to_string()
    } else {
        DOCS_MISSING.to_string()
    }
}

/// Minimal lint pass. Currently a single check for debug print calls.
// TODO: shell out to a real linter (ruff/clippy) instead of this stub.
pub fn lint_code(code: &str) -> String {
    let mut issues = Vec::new();
    if DEBUG_PRINT_MARKERS.iter().any(|m| code.contains(m)) {
        issues.push("Consider removing debug print statements.");
    }

    if issues.is_empty() {
        NO_LINT_ISSUES.to_string()
    } else {
        issues.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readme_counts_as_documentation() {
        assert_eq!(
            check_documentation_updates("README.md\nsrc/x.py"),
            "Documentation files were updated."
        );
    }

    #[test]
    fn test_docs_directory_counts_as_documentation() {
        assert_eq!(
            check_documentation_updates("docs/guide.md\nsrc/lib.rs"),
            "Documentation files were updated."
        );
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert_eq!(check_documentation_updates("ReadMe.rst"), "Documentation files were updated.");
    }

    #[test]
    fn test_code_only_changes_suggest_doc_review() {
        let report = check_documentation_updates("src/x.py");
        assert!(report.starts_with("No documentation updates detected."));
    }

    #[test]
    fn test_empty_list_suggests_doc_review() {
        assert!(check_documentation_updates("").starts_with("No documentation updates detected."));
    }

    #[test]
    fn test_lint_flags_debug_prints() {
        assert_eq!(lint_code("print(x)"), "Consider removing debug print statements.");
        assert_eq!(
            lint_code("println!(\"{:?}\", state);"),
            "Consider removing debug print statements."
        );
    }

    #[test]
    fn test_lint_clean_code() {
        assert_eq!(lint_code("let x = 1;"), "No linting issues found.");
    }
}
