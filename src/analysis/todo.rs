//! TODO/FIXME marker scan.

use std::sync::OnceLock;

use regex::Regex;

const NO_TODOS: &str = "No TODO or FIXME comments found.";

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `#` and `//` line comments; the marker keyword plus the rest of the line.
        Regex::new(r"(?i)(?:#+|/{2,})\s*(TODO|FIXME)\b:?\s*([^\n]*)").expect("todo regex compiles")
    })
}

/// List all TODO and FIXME comments found in a snippet as `KIND: text` lines.
pub fn find_todo_comments(code: &str) -> String {
    let findings: Vec<String> = marker_re()
        .captures_iter(code)
        .map(|caps| format!("{}: {}", caps[1].to_uppercase(), caps[2].trim_end()))
        .collect();

    if findings.is_empty() {
        NO_TODOS.to_string()
    } else {
        findings.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_python_style_todo() {
        assert_eq!(find_todo_comments("# TODO: fix this\nx = 1"), "TODO: fix this");
    }

    #[test]
    fn test_finds_rust_style_fixme() {
        let code = "fn main() {\n    // FIXME handle overflow\n}\n";
        assert_eq!(find_todo_comments(code), "FIXME: handle overflow");
    }

    #[test]
    fn test_marker_is_case_insensitive_and_normalized() {
        assert_eq!(find_todo_comments("# todo clean up"), "TODO: clean up");
    }

    #[test]
    fn test_multiple_markers_one_per_line() {
        let code = "# TODO: first\ncode()\n// FIXME: second\n";
        assert_eq!(find_todo_comments(code), "TODO: first\nFIXME: second");
    }

    #[test]
    fn test_none_found_message() {
        assert_eq!(
            find_todo_comments("fn main() { println!(\"hi\"); }"),
            "No TODO or FIXME comments found."
        );
    }

    #[test]
    fn test_does_not_match_identifiers() {
        // "todo" outside a comment marker shouldn't fire.
        assert_eq!(
            find_todo_comments("let todos = fetch_todos();"),
            "No TODO or FIXME comments found."
        );
    }
}
