//! Repository references and diff-text helpers shared by the tools.

use crate::error::PrReviewError;

const GITHUB_URL_PREFIX: &str = "https://github.com/";

/// An owner/name pair derived from a full GitHub repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/<owner>/<repo>`, tolerating a trailing
    /// slash or `.git` suffix. Anything else is rejected up front rather
    /// than letting a mangled API path surface as a confusing upstream 404.
    pub fn parse(url: &str) -> Result<Self, PrReviewError> {
        let rest = url
            .trim()
            .strip_prefix(GITHUB_URL_PREFIX)
            .ok_or_else(|| PrReviewError::InvalidRepoUrl(url.to_string()))?;
        let rest = rest.trim_end_matches('/');
        let rest = rest.strip_suffix(".git").unwrap_or(rest);

        let (owner, repo) = rest
            .split_once('/')
            .ok_or_else(|| PrReviewError::InvalidRepoUrl(url.to_string()))?;
        if repo.contains('/') {
            return Err(PrReviewError::InvalidRepoUrl(url.to_string()));
        }
        sanitize_github_name(owner, "owner")?;
        sanitize_github_name(repo, "repo")?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Base API path for this repository (`/repos/{owner}/{repo}`).
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Validate that a GitHub owner/repo name doesn't contain characters that
/// could be used for URL injection in raw API routes.
pub fn sanitize_github_name(name: &str, field: &str) -> Result<(), PrReviewError> {
    if name.is_empty() {
        return Err(PrReviewError::invalid_param(format!(
            "{} must not be empty",
            field
        )));
    }
    for ch in ['/', '?', '#', '%', '\0', ' ', '\n', '\t'] {
        if name.contains(ch) {
            return Err(PrReviewError::invalid_param(format!(
                "{} contains invalid character '{}'",
                field, ch
            )));
        }
    }
    Ok(())
}

/// Validate a value for use in URL paths or query params. Unlike
/// `sanitize_github_name`, this allows slashes (for git refs like
/// `feature/foo` or file paths like `src/main.rs`).
pub fn sanitize_url_value(value: &str, field: &str) -> Result<(), PrReviewError> {
    if value.is_empty() {
        return Err(PrReviewError::invalid_param(format!(
            "{} must not be empty",
            field
        )));
    }
    for ch in ['?', '#', '&', '\0', '\n', '\r', '\t'] {
        if value.contains(ch) {
            return Err(PrReviewError::invalid_param(format!(
                "{} contains invalid character",
                field
            )));
        }
    }
    Ok(())
}

/// Requested subset of a diff, as passed by the calling agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffRange {
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub total_lines: Option<usize>,
}

/// Return the requested subset of a unified diff.
///
/// Line numbers are 1-indexed and the range is inclusive. A range needs
/// both bounds; `total_lines` takes the first N lines and is ignored when
/// a range is given. With neither, the full diff comes back. Bounds past
/// the end of the diff are clamped, not rejected — the caller usually
/// doesn't know the diff length in advance.
pub fn slice_diff(diff: &str, range: DiffRange) -> Result<String, PrReviewError> {
    let lines: Vec<&str> = diff.lines().collect();

    let selected: &[&str] = match (range.start_line, range.end_line) {
        (Some(start), Some(end)) => {
            if start == 0 {
                return Err(PrReviewError::invalid_param("start_line must be at least 1"));
            }
            if end < start {
                return Err(PrReviewError::invalid_param(
                    "end_line must not be smaller than start_line",
                ));
            }
            let start = start - 1;
            let end = end.min(lines.len());
            if start >= lines.len() {
                &[]
            } else {
                &lines[start..end]
            }
        }
        (None, None) => match range.total_lines {
            Some(n) => &lines[..n.min(lines.len())],
            None => &lines[..],
        },
        _ => {
            return Err(PrReviewError::invalid_param(
                "both start_line and end_line must be provided when requesting a line range",
            ))
        }
    };

    Ok(selected.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_repo_url() {
        let repo = RepoRef::parse("https://github.com/octocat/hello-world").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.repo, "hello-world");
        assert_eq!(repo.api_path(), "/repos/octocat/hello-world");
    }

    #[test]
    fn test_parse_tolerates_trailing_slash_and_git_suffix() {
        let repo = RepoRef::parse("https://github.com/octocat/hello-world/").unwrap();
        assert_eq!(repo.to_string(), "octocat/hello-world");
        let repo = RepoRef::parse("https://github.com/octocat/hello-world.git").unwrap();
        assert_eq!(repo.to_string(), "octocat/hello-world");
    }

    #[test]
    fn test_parse_rejects_non_github_urls() {
        assert!(RepoRef::parse("https://gitlab.com/octocat/hello").is_err());
        assert!(RepoRef::parse("github.com/octocat/hello").is_err());
        assert!(RepoRef::parse("not a url").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_or_extra_segments() {
        assert!(RepoRef::parse("https://github.com/octocat").is_err());
        assert!(RepoRef::parse("https://github.com/octocat/repo/pull/4").is_err());
    }

    #[test]
    fn test_parse_error_is_in_band_text() {
        let err = RepoRef::parse("https://gitlab.com/x/y").unwrap_err();
        assert!(err.to_string().contains("Error"));
    }

    #[test]
    fn test_sanitize_github_name() {
        assert!(sanitize_github_name("my-org", "owner").is_ok());
        assert!(sanitize_github_name("repo.name", "repo").is_ok());
        assert!(sanitize_github_name("", "owner").is_err());
        assert!(sanitize_github_name("owner/repo", "owner").is_err());
        assert!(sanitize_github_name("owner?evil=1", "owner").is_err());
        assert!(sanitize_github_name("my repo", "repo").is_err());
    }

    #[test]
    fn test_sanitize_url_value_allows_slashes() {
        assert!(sanitize_url_value("feature/my-branch", "ref").is_ok());
        assert!(sanitize_url_value("src/lib/utils.rs", "path").is_ok());
        assert!(sanitize_url_value("", "path").is_err());
        assert!(sanitize_url_value("main?evil=1", "ref").is_err());
        assert!(sanitize_url_value("val\nx", "path").is_err());
    }

    fn ten_line_diff() -> String {
        (1..=10).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_slice_diff_inclusive_range() {
        let range = DiffRange {
            start_line: Some(3),
            end_line: Some(5),
            total_lines: None,
        };
        let sliced = slice_diff(&ten_line_diff(), range).unwrap();
        assert_eq!(sliced, "line 3\nline 4\nline 5");
    }

    #[test]
    fn test_slice_diff_single_bound_is_usage_error() {
        let range = DiffRange {
            start_line: Some(3),
            end_line: None,
            total_lines: None,
        };
        let err = slice_diff(&ten_line_diff(), range).unwrap_err();
        assert!(err.to_string().contains("Error"));
        assert!(err.to_string().contains("both start_line and end_line"));
    }

    #[test]
    fn test_slice_diff_total_lines_cap() {
        let range = DiffRange {
            total_lines: Some(2),
            ..Default::default()
        };
        assert_eq!(slice_diff(&ten_line_diff(), range).unwrap(), "line 1\nline 2");
    }

    #[test]
    fn test_slice_diff_range_wins_over_total_lines() {
        let range = DiffRange {
            start_line: Some(1),
            end_line: Some(1),
            total_lines: Some(9),
        };
        assert_eq!(slice_diff(&ten_line_diff(), range).unwrap(), "line 1");
    }

    #[test]
    fn test_slice_diff_no_range_returns_everything() {
        assert_eq!(slice_diff(&ten_line_diff(), DiffRange::default()).unwrap(), ten_line_diff());
    }

    #[test]
    fn test_slice_diff_clamps_out_of_bounds() {
        let range = DiffRange {
            start_line: Some(9),
            end_line: Some(50),
            total_lines: None,
        };
        assert_eq!(slice_diff(&ten_line_diff(), range).unwrap(), "line 9\nline 10");

        let range = DiffRange {
            start_line: Some(20),
            end_line: Some(30),
            total_lines: None,
        };
        assert_eq!(slice_diff(&ten_line_diff(), range).unwrap(), "");
    }

    #[test]
    fn test_slice_diff_rejects_zero_start() {
        let range = DiffRange {
            start_line: Some(0),
            end_line: Some(5),
            total_lines: None,
        };
        assert!(slice_diff(&ten_line_diff(), range).is_err());
    }
}
