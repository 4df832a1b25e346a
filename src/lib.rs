//! MCP server that lets LLM agents review GitHub pull requests.
//!
//! Provides tools for listing open PRs, fetching full or per-file diffs and
//! changed-file lists, plus local heuristics: TODO/FIXME scanning,
//! syntax-tree code-smell detection, and regex security checks.

pub mod analysis;
pub mod error;
pub mod github;
pub mod server;
