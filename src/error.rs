/// Tool-level failures.
///
/// Every variant renders with a leading `Error` so that when a failure is
/// returned in-band as tool output, the calling agent can recognize it and
/// read the upstream message (octocrab's display carries the GitHub
/// response's `message` field for non-200s).
#[derive(Debug, thiserror::Error)]
pub enum PrReviewError {
    #[error("Error {context}: {source}")]
    GitHub {
        context: &'static str,
        #[source]
        source: octocrab::Error,
    },

    #[error("Error: invalid repository URL '{0}' (expected https://github.com/<owner>/<repo>)")]
    InvalidRepoUrl(String),

    #[error("Error: {0}")]
    InvalidParam(String),

    #[error("Error analyzing code: {0}")]
    Analysis(String),
}

impl PrReviewError {
    /// Wrap an octocrab error with a short description of the call that failed.
    pub fn github(context: &'static str, source: octocrab::Error) -> Self {
        Self::GitHub { context, source }
    }

    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidParam(message.into())
    }
}
