use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;
use std::time::Instant;

use crate::error::{classify_tool_failure, Result, ShiplogError};
use crate::model::{Commit, CommitSet, FETCH_LIMIT};
use crate::retriever::{CancelToken, CommitSource};

/// One result from `gh search commits --json repository,commit`.
///
/// Field names vary between gh versions and endpoints, so every field is
/// optional and resolution falls back across them.
#[derive(Debug, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    repository: RepoField,
    #[serde(default)]
    commit: CommitField,
}

#[derive(Debug, Default, Deserialize)]
struct RepoField {
    #[serde(default, rename = "nameWithOwner")]
    name_with_owner: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct CommitField {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "messageHeadline")]
    message_headline: String,
}

impl SearchItem {
    fn repository(&self) -> &str {
        if !self.repository.name_with_owner.is_empty() {
            &self.repository.name_with_owner
        } else if !self.repository.full_name.is_empty() {
            &self.repository.full_name
        } else {
            &self.repository.name
        }
    }

    fn headline(&self) -> &str {
        if !self.commit.message_headline.is_empty() {
            &self.commit.message_headline
        } else {
            self.commit.message.lines().next().unwrap_or("")
        }
    }
}

/// Parse tool output as either a single JSON array or a stream of
/// whitespace/newline-delimited records. Malformed trailing input is an
/// error, never silently dropped.
pub fn parse_items(data: &[u8]) -> Result<Vec<SearchItem>> {
    let trimmed = trim_ascii(data);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed[0] == b'[' {
        return serde_json::from_slice(trimmed)
            .map_err(|e| ShiplogError::Parse(format!("invalid commit search output: {e}")));
    }

    let mut items = Vec::new();
    for item in serde_json::Deserializer::from_slice(trimmed).into_iter::<SearchItem>() {
        items.push(
            item.map_err(|e| ShiplogError::Parse(format!("invalid commit search record: {e}")))?,
        );
    }
    Ok(items)
}

fn trim_ascii(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end]
}

/// Group parsed items into a CommitSet, discarding records missing a
/// repository or message and flagging truncation at the fetch cap.
pub fn build_commit_set(items: Vec<SearchItem>, limit: usize) -> CommitSet {
    let warning = (items.len() >= limit).then(|| {
        format!("Results capped at {limit} commits; the summary may be incomplete.")
    });

    let mut by_repo: HashMap<String, Vec<Commit>> = HashMap::new();
    for item in &items {
        let repo = item.repository();
        let message = item.headline();
        if repo.is_empty() || message.is_empty() {
            continue;
        }
        by_repo.entry(repo.to_string()).or_default().push(Commit {
            repository: repo.to_string(),
            message: message.to_string(),
        });
    }

    CommitSet::from_commits(by_repo, warning)
}

/// Commit source backed by the GitHub CLI.
pub struct GhClient {
    limit: usize,
}

impl GhClient {
    pub fn new() -> Self {
        Self { limit: FETCH_LIMIT }
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        let started = Instant::now();
        let output = Command::new("gh").args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShiplogError::GhMissing
            } else {
                ShiplogError::Io(e)
            }
        })?;
        info!(
            "gh {} finished in {}ms (status {})",
            args.first().copied().unwrap_or(""),
            started.elapsed().as_millis(),
            output.status
        );
        Ok(output)
    }
}

impl Default for GhClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitSource for GhClient {
    fn current_user(&self) -> Result<String> {
        let output = self.run(&["api", "user", "--jq", ".login"])?;
        if !output.status.success() {
            return Err(classify_tool_failure(&String::from_utf8_lossy(
                &output.stderr,
            )));
        }
        let login = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if login.is_empty() {
            return Err(ShiplogError::Auth);
        }
        Ok(login)
    }

    fn fetch(&self, author: &str, query: &str, cancel: &CancelToken) -> Result<CommitSet> {
        if cancel.is_cancelled() {
            return Err(ShiplogError::Cancelled);
        }

        let limit = self.limit.to_string();
        let output = self.run(&[
            "search",
            "commits",
            "--author",
            author,
            "--committer-date",
            query,
            "--json",
            "repository,commit",
            "--limit",
            &limit,
        ])?;

        if !output.status.success() {
            // gh mixes failure detail between streams; classify over both.
            let mut combined = String::from_utf8_lossy(&output.stderr).into_owned();
            combined.push('\n');
            combined.push_str(&String::from_utf8_lossy(&output.stdout));
            return Err(classify_tool_failure(&combined));
        }

        if cancel.is_cancelled() {
            return Err(ShiplogError::Cancelled);
        }

        let items = parse_items(&output.stdout)?;
        debug!("parsed {} commit search items for {query}", items.len());
        Ok(build_commit_set(items, self.limit))
    }
}
