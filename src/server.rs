use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler};
use serde::Deserialize;

use crate::analysis::smells::{SmellThresholds, SnippetLanguage};
use crate::analysis::{security, smells, style, todo};
use crate::error::PrReviewError;
use crate::github::{self, DiffRange, RepoRef};

const NO_OPEN_PULLS: &str = "No open pull requests found.";
const NO_CHANGED_FILES: &str = "No files changed in this pull request.";
const NO_SEARCH_RESULTS: &str = "No matching code found in this repository.";

#[derive(Clone)]
pub struct PrReviewServer {
    github: Arc<octocrab::Octocrab>,
    max_results: u32,
    thresholds: SmellThresholds,
    tool_router: ToolRouter<Self>,
}

// -- Tool parameter types --

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPullsParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "Maximum number of results")]
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PullParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "Pull request number")]
    pub pr_number: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PullDiffParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "Pull request number")]
    pub pr_number: u64,

    #[schemars(description = "First diff line to return (1-indexed, requires end_line)")]
    #[serde(default)]
    pub start_line: Option<usize>,

    #[schemars(description = "Last diff line to return (inclusive, requires start_line)")]
    #[serde(default)]
    pub end_line: Option<usize>,

    #[schemars(description = "Return only the first N lines (ignored when a range is given)")]
    #[serde(default)]
    pub total_lines: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileDiffParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "Pull request number")]
    pub pr_number: u64,

    #[schemars(description = "Path of the changed file, e.g. 'src/main.rs'")]
    pub file_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChangedFilesParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "Pull request number")]
    pub pr_number: u64,

    #[schemars(description = "Output shape: 'lines' (newline-joined, default) or 'json'")]
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CodeParams {
    #[schemars(description = "Source code to analyze")]
    pub code: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SmellParams {
    #[schemars(description = "Source code to analyze")]
    pub code: String,

    #[schemars(description = "Snippet language: 'python' (default) or 'rust'")]
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChangedFileListParams {
    #[schemars(description = "Newline-separated list of changed file paths")]
    pub changed_files: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchCodeParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "Search query (GitHub code search syntax)")]
    pub query: String,

    #[schemars(description = "Maximum number of results")]
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileContentsParams {
    #[schemars(description = "Repository URL, e.g. 'https://github.com/rust-lang/cargo'")]
    pub repo_url: String,

    #[schemars(description = "File path within the repository")]
    pub path: String,

    #[schemars(description = "Git ref (branch, tag, or SHA). Defaults to the repo's default branch")]
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}

impl PrReviewServer {
    pub fn new(github: octocrab::Octocrab, max_results: u32, thresholds: SmellThresholds) -> Self {
        Self {
            github: Arc::new(github),
            max_results,
            thresholds,
            tool_router: Self::tool_router(),
        }
    }

    /// Cap per_page to 100 (GitHub API maximum) and safely cast to u8.
    fn capped_per_page(&self, per_page: Option<u32>) -> u8 {
        std::cmp::min(per_page.unwrap_or(self.max_results), 100) as u8
    }

    /// Fetch the PR's changed-file entries (`/pulls/{n}/files`), each a JSON
    /// object carrying at least `filename` and, for text changes, `patch`.
    async fn fetch_changed_files(
        &self,
        repo: &RepoRef,
        pr_number: u64,
    ) -> Result<Vec<serde_json::Value>, PrReviewError> {
        let route = format!("{}/pulls/{}/files?per_page=100", repo.api_path(), pr_number);
        self.github
            .get(&route, None::<&()>)
            .await
            .map_err(|e| PrReviewError::github("fetching the pull request file list", e))
    }
}

/// Wrap a successful tool payload.
fn text_reply(text: String) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Convert a tool outcome into an in-band result. Failures become error
/// *content* rather than protocol errors, so the agent can read the message
/// and decide what to try next.
fn reply(outcome: Result<String, PrReviewError>) -> Result<CallToolResult, ErrorData> {
    Ok(match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
    })
}

/// Newline-join findings, or fall back to a fixed message when there are none.
fn join_or(lines: Vec<String>, empty_message: &str) -> String {
    if lines.is_empty() {
        empty_message.to_string()
    } else {
        lines.join("\n")
    }
}

/// Look up one file's patch in the changed-file entries.
fn file_patch(files: &[serde_json::Value], file_path: &str) -> String {
    for file in files {
        if file.get("filename").and_then(|v| v.as_str()) == Some(file_path) {
            return match file.get("patch").and_then(|v| v.as_str()) {
                Some(patch) => patch.to_string(),
                None => format!("No diff (patch) available for file: {}", file_path),
            };
        }
    }
    format!("File '{}' not found in the pull request.", file_path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangedFilesFormat {
    Lines,
    Json,
}

impl ChangedFilesFormat {
    fn from_param(value: Option<&str>) -> Result<Self, PrReviewError> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("lines") => Ok(Self::Lines),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(PrReviewError::invalid_param(format!(
                "unknown format '{}' (expected 'lines' or 'json')",
                other
            ))),
        }
    }
}

fn format_changed_files(files: &[serde_json::Value], format: ChangedFilesFormat) -> String {
    let names: Vec<&str> = files
        .iter()
        .filter_map(|f| f.get("filename").and_then(|v| v.as_str()))
        .collect();
    match format {
        ChangedFilesFormat::Lines => {
            if names.is_empty() {
                NO_CHANGED_FILES.to_string()
            } else {
                names.join("\n")
            }
        }
        ChangedFilesFormat::Json => {
            serde_json::to_string_pretty(&names).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

fn resolve_language(param: Option<&str>) -> Result<SnippetLanguage, PrReviewError> {
    param.map_or(Ok(SnippetLanguage::default()), SnippetLanguage::from_name)
}

/// Decode the base64 `content` field of a contents-API response (GitHub
/// returns base64 with embedded newlines).
fn decode_contents(response: &serde_json::Value) -> String {
    response
        .get("content")
        .and_then(|c| c.as_str())
        .map(|c| {
            let cleaned: String = c.chars().filter(|ch| !ch.is_whitespace()).collect();
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&cleaned)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_else(|| "[binary content]".to_string())
        })
        .unwrap_or_default()
}

/// Format an issue/PR state as a lowercase string.
fn format_state(state: &octocrab::models::IssueState) -> &'static str {
    match state {
        octocrab::models::IssueState::Open => "open",
        octocrab::models::IssueState::Closed => "closed",
        _ => "unknown",
    }
}

// -- GitHub-bound operations (fallible bodies behind the thin tool wrappers) --

impl PrReviewServer {
    async fn do_list_open_pulls(&self, params: ListPullsParams) -> Result<String, PrReviewError> {
        let repo = RepoRef::parse(&params.repo_url)?;
        let per_page = self.capped_per_page(params.per_page);

        let pulls = self
            .github
            .pulls(&repo.owner, &repo.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(per_page)
            .send()
            .await
            .map_err(|e| PrReviewError::github("fetching open pull requests", e))?;

        let lines: Vec<String> = pulls
            .items
            .iter()
            .map(|p| {
                format!(
                    "PR #{}: {} - {}",
                    p.number,
                    p.title.as_deref().unwrap_or(""),
                    p.html_url.as_ref().map(|u| u.as_str()).unwrap_or(""),
                )
            })
            .collect();

        Ok(join_or(lines, NO_OPEN_PULLS))
    }

    async fn do_get_pull(&self, params: PullParams) -> Result<String, PrReviewError> {
        let repo = RepoRef::parse(&params.repo_url)?;

        let pr = self
            .github
            .pulls(&repo.owner, &repo.repo)
            .get(params.pr_number)
            .await
            .map_err(|e| PrReviewError::github("fetching the pull request", e))?;

        let text = serde_json::to_string_pretty(&serde_json::json!({
            "number": pr.number,
            "title": pr.title.as_deref().unwrap_or(""),
            "state": pr.state.as_ref().map(format_state).unwrap_or("unknown"),
            "author": pr.user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown"),
            "body": pr.body.as_deref().unwrap_or(""),
            "head": pr.head.ref_field,
            "base": pr.base.ref_field,
            "draft": pr.draft,
            "mergeable": pr.mergeable,
            "additions": pr.additions,
            "deletions": pr.deletions,
            "changed_files": pr.changed_files,
            "created_at": pr.created_at.map(|t| t.to_string()),
        }))
        .unwrap_or_else(|_| "{}".to_string());
        Ok(text)
    }

    async fn do_get_pull_diff(&self, params: PullDiffParams) -> Result<String, PrReviewError> {
        let repo = RepoRef::parse(&params.repo_url)?;

        let diff = self
            .github
            .pulls(&repo.owner, &repo.repo)
            .get_diff(params.pr_number)
            .await
            .map_err(|e| PrReviewError::github("fetching the pull request diff", e))?;

        github::slice_diff(
            &diff,
            DiffRange {
                start_line: params.start_line,
                end_line: params.end_line,
                total_lines: params.total_lines,
            },
        )
    }

    async fn do_get_file_diff(&self, params: FileDiffParams) -> Result<String, PrReviewError> {
        let repo = RepoRef::parse(&params.repo_url)?;
        let files = self.fetch_changed_files(&repo, params.pr_number).await?;
        Ok(file_patch(&files, &params.file_path))
    }

    async fn do_list_changed_files(
        &self,
        params: ChangedFilesParams,
    ) -> Result<String, PrReviewError> {
        let format = ChangedFilesFormat::from_param(params.format.as_deref())?;
        let repo = RepoRef::parse(&params.repo_url)?;
        let files = self.fetch_changed_files(&repo, params.pr_number).await?;
        Ok(format_changed_files(&files, format))
    }

    async fn do_search_code(&self, params: SearchCodeParams) -> Result<String, PrReviewError> {
        let repo = RepoRef::parse(&params.repo_url)?;
        let query = format!("{} repo:{}", params.query, repo);
        let per_page = self.capped_per_page(params.per_page);

        let results = self
            .github
            .search()
            .code(&query)
            .per_page(per_page)
            .send()
            .await
            .map_err(|e| PrReviewError::github("searching code", e))?;

        let lines: Vec<String> = results
            .items
            .iter()
            .map(|item| format!("{} - {}", item.path, item.html_url))
            .collect();

        Ok(join_or(lines, NO_SEARCH_RESULTS))
    }

    async fn do_get_file_contents(
        &self,
        params: FileContentsParams,
    ) -> Result<String, PrReviewError> {
        let repo = RepoRef::parse(&params.repo_url)?;
        github::sanitize_url_value(&params.path, "path")?;

        let mut route = format!("{}/contents/{}", repo.api_path(), params.path);
        if let Some(ref git_ref) = params.git_ref {
            github::sanitize_url_value(git_ref, "ref")?;
            route.push_str(&format!("?ref={}", git_ref));
        }

        let response: serde_json::Value = self
            .github
            .get(&route, None::<&()>)
            .await
            .map_err(|e| PrReviewError::github("fetching file contents", e))?;

        Ok(decode_contents(&response))
    }
}

// -- MCP tool handlers (thin wrappers over the do_* methods and heuristics) --

#[tool_router]
impl PrReviewServer {
    #[tool(
        name = "list_open_pulls",
        description = "List open pull requests for a repository as 'PR #n: title - url' lines"
    )]
    async fn list_open_pulls(
        &self,
        Parameters(params): Parameters<ListPullsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_list_open_pulls(params).await)
    }

    #[tool(
        name = "get_pull",
        description = "Get pull request details including body, change stats, and mergeability"
    )]
    async fn get_pull(
        &self,
        Parameters(params): Parameters<PullParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_get_pull(params).await)
    }

    #[tool(
        name = "get_pull_diff",
        description = "Get the unified diff of a pull request, optionally sliced to a line range or capped to the first N lines"
    )]
    async fn get_pull_diff(
        &self,
        Parameters(params): Parameters<PullDiffParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_get_pull_diff(params).await)
    }

    #[tool(
        name = "get_file_diff",
        description = "Get the diff (patch) for a single file within a pull request"
    )]
    async fn get_file_diff(
        &self,
        Parameters(params): Parameters<FileDiffParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_get_file_diff(params).await)
    }

    #[tool(
        name = "list_changed_files",
        description = "List the file paths touched by a pull request"
    )]
    async fn list_changed_files(
        &self,
        Parameters(params): Parameters<ChangedFilesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_list_changed_files(params).await)
    }

    #[tool(
        name = "find_todo_comments",
        description = "Find TODO and FIXME comments in a code snippet"
    )]
    async fn find_todo_comments(
        &self,
        Parameters(params): Parameters<CodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        text_reply(todo::find_todo_comments(&params.code))
    }

    #[tool(
        name = "detect_code_smells",
        description = "Detect structural code smells (long functions, deeply nested loops) in a snippet"
    )]
    async fn detect_code_smells(
        &self,
        Parameters(params): Parameters<SmellParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let outcome = resolve_language(params.language.as_deref())
            .and_then(|lang| smells::detect_code_smells(&params.code, lang, &self.thresholds));
        reply(outcome)
    }

    #[tool(
        name = "security_check_code",
        description = "Heuristically scan a snippet for hardcoded credentials, risky calls, and SQL string-building"
    )]
    async fn security_check_code(
        &self,
        Parameters(params): Parameters<CodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        text_reply(security::security_check_code(&params.code))
    }

    #[tool(
        name = "check_documentation_updates",
        description = "Check whether a changed-file list includes documentation updates"
    )]
    async fn check_documentation_updates(
        &self,
        Parameters(params): Parameters<ChangedFileListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        text_reply(style::check_documentation_updates(&params.changed_files))
    }

    #[tool(
        name = "lint_code",
        description = "Run a minimal lint pass over a snippet (currently flags debug print calls)"
    )]
    async fn lint_code(
        &self,
        Parameters(params): Parameters<CodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        text_reply(style::lint_code(&params.code))
    }

    #[tool(
        name = "search_code",
        description = "Search code within one repository using GitHub's code search syntax"
    )]
    async fn search_code(
        &self,
        Parameters(params): Parameters<SearchCodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_search_code(params).await)
    }

    #[tool(
        name = "get_file_contents",
        description = "Get the decoded content of a repository file at a specific ref"
    )]
    async fn get_file_contents(
        &self,
        Parameters(params): Parameters<FileContentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        reply(self.do_get_file_contents(params).await)
    }
}

#[tool_handler]
impl ServerHandler for PrReviewServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-pr-review".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "GitHub pull-request review server. Use list_open_pulls to find PRs, \
                 get_pull for PR details, get_pull_diff for the full or sliced diff, \
                 get_file_diff for one file's patch, list_changed_files for touched paths, \
                 find_todo_comments/detect_code_smells/security_check_code/lint_code to \
                 analyze snippets, check_documentation_updates to spot missing docs, \
                 search_code to search the repository, and get_file_contents to read files. \
                 Tool failures come back as text starting with 'Error' — read the message \
                 before retrying."
                    .to_string(),
            ),
        }
    }
}
