use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShiplogError>;

#[derive(Error, Debug)]
pub enum ShiplogError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("GitHub authentication required. Run 'gh auth login' to authenticate.")]
    Auth,
    #[error("GitHub API rate limit exceeded. Please wait and try again later.")]
    RateLimit,
    #[error("Network error. Please check your internet connection and try again.")]
    Network,
    #[error("GitHub CLI (gh) is not installed. Install it from https://cli.github.com/")]
    GhMissing,
    #[error("No commits found for {0}")]
    NotFound(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("Cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Error: {0}")]
    Other(String),
}

/// Classify the failure output of the external tool into the error taxonomy.
///
/// Matching is case-insensitive over the tool's combined stdout/stderr, the
/// only signal the CLI gives us. Unrecognized output falls back to a generic
/// error carrying the raw text.
pub fn classify_tool_failure(output: &str) -> ShiplogError {
    let lower = output.to_lowercase();

    if lower.contains("authentication")
        || lower.contains("not logged in")
        || lower.contains("unauthorized")
        || lower.contains("401")
    {
        return ShiplogError::Auth;
    }
    if lower.contains("rate limit") {
        return ShiplogError::RateLimit;
    }
    if lower.contains("network")
        || lower.contains("connection")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("dns")
    {
        return ShiplogError::Network;
    }

    let trimmed = output.trim();
    if trimmed.is_empty() {
        ShiplogError::Other("command failed with no output".into())
    } else {
        ShiplogError::Other(trimmed.to_string())
    }
}
