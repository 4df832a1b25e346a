//! Heuristic security scan.
//!
//! Pattern-matches the usual suspects: credentials assigned as string
//! literals, dynamic evaluation, shell invocation, and string-built SQL.
//! A clean report here means "nothing obvious", not "secure".

use std::sync::OnceLock;

use regex::Regex;

const NO_ISSUES: &str = "No obvious security vulnerabilities detected based on heuristic analysis.";

/// Assignments of string literals to credential-looking names.
fn credential_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r#"(?i)api[-_]?key\s*=\s*['"][^'"]+['"]"#,
            r#"(?i)secret\s*=\s*['"][^'"]+['"]"#,
            r#"(?i)password\s*=\s*['"][^'"]+['"]"#,
            r#"(?i)token\s*=\s*['"][^'"]+['"]"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("credential regex compiles"))
        .collect()
    })
}

/// SQL statements assembled with concatenation or interpolation.
fn sql_injection_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [r"execute\(.+\+.+\)", r"format\(.+%\(.+\)s.+\)"]
            .iter()
            .map(|p| Regex::new(p).expect("sql regex compiles"))
            .collect()
    })
}

/// Scan a snippet for common security red flags and report them as one
/// finding line per category.
pub fn security_check_code(code: &str) -> String {
    let mut issues = Vec::new();

    let credentials: Vec<&str> = credential_res()
        .iter()
        .flat_map(|re| re.find_iter(code).map(|m| m.as_str()))
        .collect();
    if !credentials.is_empty() {
        issues.push(format!(
            "Potential hardcoded credential(s) found: {}",
            credentials.join(", ")
        ));
    }

    if code.contains("eval(") {
        issues.push(
            "Usage of eval() detected, which can lead to security vulnerabilities if misused."
                .to_string(),
        );
    }

    if code.contains("os.system(") || code.contains("shell=True") {
        issues.push(
            "Shell invocation detected; consider using safer alternatives to avoid command injection risks."
                .to_string(),
        );
    }

    let sql_hits: Vec<&str> = sql_injection_res()
        .iter()
        .flat_map(|re| re.find_iter(code).map(|m| m.as_str()))
        .collect();
    if !sql_hits.is_empty() {
        issues.push(format!(
            "Potential SQL injection risk found in statements: {}",
            sql_hits.join(", ")
        ));
    }

    if issues.is_empty() {
        NO_ISSUES.to_string()
    } else {
        issues.join("\n")
    }
}
