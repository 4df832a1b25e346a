use anyhow::Result;
use clap::Parser;
use mcp_pr_review::analysis::smells::SmellThresholds;
use mcp_pr_review::server;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

/// MCP server for GitHub pull-request review — lets LLM agents fetch PR
/// diffs and run code-review heuristics
#[derive(Parser)]
#[command(name = "mcp-pr-review", version, about)]
struct Cli {
    /// GitHub personal access token.
    /// Can also be set via GITHUB_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,

    /// Read GitHub token from an environment variable.
    /// Default: GITHUB_TOKEN
    #[arg(long = "token-env")]
    token_env: Option<String>,

    /// Maximum results per API call (default: 30)
    #[arg(long, default_value = "30")]
    max_results: u32,

    /// Statement count above which a function is reported as long
    #[arg(long, default_value = "20")]
    long_function_threshold: usize,

    /// Nested-loop count above which a loop is reported as deeply nested
    #[arg(long, default_value = "2")]
    loop_nesting_threshold: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Resolve token: --token > --token-env > GITHUB_TOKEN
    let token = if let Some(t) = cli.token {
        Some(t)
    } else {
        let env_name = cli.token_env.as_deref().unwrap_or("GITHUB_TOKEN");
        match std::env::var(env_name) {
            Ok(t) if !t.is_empty() => {
                tracing::info!(env = env_name, "Read GitHub token from environment variable");
                Some(t)
            }
            _ => None,
        }
    };

    let github = if let Some(ref t) = token {
        octocrab::OctocrabBuilder::new()
            .personal_token(t.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create GitHub client: {}", e))?
    } else {
        tracing::warn!("No GitHub token provided — API rate limits will be very restrictive");
        octocrab::Octocrab::default()
    };

    let thresholds = SmellThresholds {
        long_function_statements: cli.long_function_threshold,
        loop_nesting: cli.loop_nesting_threshold,
    };

    tracing::info!(
        authenticated = token.is_some(),
        max_results = cli.max_results,
        long_function_threshold = thresholds.long_function_statements,
        loop_nesting_threshold = thresholds.loop_nesting,
        "Starting mcp-pr-review server"
    );

    let service = server::PrReviewServer::new(github, cli.max_results, thresholds);
    let running = service.serve(stdio()).await?;
    running.waiting().await?;

    Ok(())
}
