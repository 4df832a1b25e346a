//! Structural code-smell detection on a tree-sitter syntax tree.
//!
//! Two checks: function bodies with too many statements, and loops whose
//! subtree contains too many loop constructs. Both thresholds are
//! configurable from the CLI.

use tree_sitter::{Node, Parser};

use crate::error::PrReviewError;

const CLEAN: &str = "No code smells detected.";

#[derive(Debug, Clone, Copy)]
pub struct SmellThresholds {
    /// Statement count above which a function body is flagged as long.
    pub long_function_statements: usize,
    /// Loop-construct count (the loop itself plus nested ones) above which
    /// a loop is flagged as deeply nested.
    pub loop_nesting: usize,
}

impl Default for SmellThresholds {
    fn default() -> Self {
        Self {
            long_function_statements: 20,
            loop_nesting: 2,
        }
    }
}

/// Languages the smell scan can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetLanguage {
    Python,
    Rust,
}

impl SnippetLanguage {
    pub fn from_name(name: &str) -> Result<Self, PrReviewError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "rust" | "rs" => Ok(Self::Rust),
            other => Err(PrReviewError::invalid_param(format!(
                "unsupported language '{}' (expected 'python' or 'rust')",
                other
            ))),
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
        }
    }

    fn is_function(&self, kind: &str) -> bool {
        match self {
            Self::Python => kind == "function_definition",
            Self::Rust => kind == "function_item",
        }
    }

    fn is_loop(&self, kind: &str) -> bool {
        match self {
            Self::Python => matches!(kind, "for_statement" | "while_statement"),
            Self::Rust => {
                matches!(kind, "for_expression" | "while_expression" | "loop_expression")
            }
        }
    }
}

impl Default for SnippetLanguage {
    fn default() -> Self {
        Self::Python
    }
}

/// Parse a snippet and report long functions and deeply nested loops.
///
/// An unparseable snippet is an `Err` (which the server hands back as an
/// in-band error string), never a panic.
pub fn detect_code_smells(
    code: &str,
    language: SnippetLanguage,
    thresholds: &SmellThresholds,
) -> Result<String, PrReviewError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| PrReviewError::Analysis(e.to_string()))?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| PrReviewError::Analysis("parser produced no syntax tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(PrReviewError::Analysis(format!(
            "snippet is not syntactically valid {:?} code",
            language
        )));
    }

    let mut findings = Vec::new();
    walk(root, code.as_bytes(), language, thresholds, &mut findings);

    Ok(if findings.is_empty() {
        CLEAN.to_string()
    } else {
        findings.join("\n")
    })
}

fn walk(
    node: Node,
    source: &[u8],
    language: SnippetLanguage,
    thresholds: &SmellThresholds,
    findings: &mut Vec<String>,
) {
    if language.is_function(node.kind()) {
        if let Some(body) = node.child_by_field_name("body") {
            let statements = body.named_child_count();
            if statements > thresholds.long_function_statements {
                let name = node
                    .child_by_field_name("name")
                    .and_then(|n| n.utf8_text(source).ok())
                    .unwrap_or("<anonymous>");
                findings.push(format!(
                    "Long function detected: {} ({} statements)",
                    name, statements
                ));
            }
        }
    }

    if language.is_loop(node.kind()) {
        // The loop itself counts, so a chain of N nested loops reports N at
        // its outermost node and nowhere below it.
        let loop_count = count_loops(node, language);
        if loop_count > thresholds.loop_nesting {
            findings.push(format!(
                "Deeply nested loop detected at line {}",
                node.start_position().row + 1
            ));
            return;
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, source, language, thresholds, findings);
    }
}

/// Number of loop constructs in this subtree, including `node` itself.
fn count_loops(node: Node, language: SnippetLanguage) -> usize {
    let mut count = usize::from(language.is_loop(node.kind()));
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        count += count_loops(child, language);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(code: &str, language: SnippetLanguage) -> String {
        detect_code_smells(code, language, &SmellThresholds::default()).unwrap()
    }

    fn python_function(statement_count: usize) -> String {
        let mut code = String::from("def bloated():\n");
        for i in 0..statement_count {
            code.push_str(&format!("    x{} = {}\n", i, i));
        }
        code
    }

    #[test]
    fn test_long_python_function_is_flagged() {
        let report = scan(&python_function(21), SnippetLanguage::Python);
        assert_eq!(report, "Long function detected: bloated (21 statements)");
    }

    #[test]
    fn test_function_at_threshold_is_clean() {
        let report = scan(&python_function(20), SnippetLanguage::Python);
        assert_eq!(report, "No code smells detected.");
    }

    #[test]
    fn test_triple_nested_python_loop_is_flagged_once() {
        let code = "\
for a in xs:
    for b in ys:
        for c in zs:
            use(a, b, c)
";
        let report = scan(code, SnippetLanguage::Python);
        assert_eq!(report, "Deeply nested loop detected at line 1");
    }

    #[test]
    fn test_double_nested_loop_is_clean() {
        let code = "\
for a in xs:
    while b:
        use(a, b)
";
        assert_eq!(scan(code, SnippetLanguage::Python), "No code smells detected.");
    }

    #[test]
    fn test_invalid_snippet_is_an_error_not_a_panic() {
        let err =
            detect_code_smells("def broken(:", SnippetLanguage::Python, &SmellThresholds::default())
                .unwrap_err();
        assert!(err.to_string().contains("Error analyzing code"));
    }

    #[test]
    fn test_rust_nested_loops() {
        let code = "\
fn main() {
    for a in 0..3 {
        for b in 0..3 {
            loop {
                break;
            }
        }
    }
}
";
        let report = scan(code, SnippetLanguage::Rust);
        assert_eq!(report, "Deeply nested loop detected at line 2");
    }

    #[test]
    fn test_rust_long_function() {
        let mut code = String::from("fn bloated() {\n");
        for i in 0..21 {
            code.push_str(&format!("    let x{} = {};\n", i, i));
        }
        code.push_str("}\n");
        let report = scan(&code, SnippetLanguage::Rust);
        assert_eq!(report, "Long function detected: bloated (21 statements)");
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = SmellThresholds {
            long_function_statements: 2,
            loop_nesting: 1,
        };
        let code = "def f():\n    a = 1\n    b = 2\n    c = 3\n";
        let report = detect_code_smells(code, SnippetLanguage::Python, &strict).unwrap();
        assert!(report.contains("Long function detected: f (3 statements)"));

        let loops = "for a in xs:\n    for b in ys:\n        pass\n";
        let report = detect_code_smells(loops, SnippetLanguage::Python, &strict).unwrap();
        assert!(report.contains("Deeply nested loop"));
    }

    #[test]
    fn test_language_from_name() {
        assert_eq!(SnippetLanguage::from_name("Python").unwrap(), SnippetLanguage::Python);
        assert_eq!(SnippetLanguage::from_name("rs").unwrap(), SnippetLanguage::Rust);
        assert!(SnippetLanguage::from_name("cobol").is_err());
    }
}
