use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::Path;

use crate::error::{Result, ShiplogError};
use crate::model::{Commit, CommitSet, DateRange, ExportFormat, Statistics, DATE_FORMAT};

/// JSON export contract; field presence and naming must stay stable for
/// downstream tooling.
#[derive(Debug, Serialize)]
struct SummaryExport<'a> {
    date: &'a str,
    total_repos: usize,
    total_commits: usize,
    commits: BTreeMap<&'a str, &'a [Commit]>,
    stats: &'a Statistics,
    generated_at: String,
}

/// Selected repos, in the set's sorted order.
fn selected_repos<'a>(
    commits: &'a CommitSet,
    selected: &HashMap<String, bool>,
) -> Vec<&'a String> {
    commits
        .repo_list
        .iter()
        .filter(|repo| selected.get(*repo).copied().unwrap_or(false))
        .collect()
}

fn commit_block(commits: &CommitSet, selected: &HashMap<String, bool>) -> String {
    let mut block = String::new();
    for repo in selected_repos(commits, selected) {
        let _ = writeln!(block, "[{repo}]:");
        for commit in &commits.by_repo[repo] {
            let _ = writeln!(block, "  • {}", commit.message);
        }
        block.push('\n');
    }
    block
}

/// Plain-text rendering: date header, bracketed repo blocks, stats footer.
pub fn render_text(
    commits: &CommitSet,
    selected: &HashMap<String, bool>,
    date_label: &str,
    stats: &Statistics,
) -> String {
    let mut out = format!("Commit summary for {date_label}\n\n");
    out.push_str(&commit_block(commits, selected));
    let _ = writeln!(
        out,
        "Total: {} commits across {} repositories",
        stats.total_commits, stats.total_repositories
    );
    out
}

/// Text rendering through a user-supplied template with `{date}`,
/// `{total_commits}`, `{total_repos}` and `{commits}` placeholders.
pub fn render_template(
    template: &str,
    commits: &CommitSet,
    selected: &HashMap<String, bool>,
    date_label: &str,
    stats: &Statistics,
) -> String {
    template
        .replace("{date}", date_label)
        .replace("{total_commits}", &stats.total_commits.to_string())
        .replace("{total_repos}", &stats.total_repositories.to_string())
        .replace("{commits}", commit_block(commits, selected).trim_end())
}

pub fn render_markdown(
    commits: &CommitSet,
    selected: &HashMap<String, bool>,
    date_label: &str,
    stats: &Statistics,
) -> String {
    let mut out = String::from("# Commit Summary\n\n");
    let _ = writeln!(out, "**Date:** {date_label}\n");

    out.push_str("## Statistics\n\n");
    let _ = writeln!(out, "- Total commits: {}", stats.total_commits);
    let _ = writeln!(out, "- Total repositories: {}", stats.total_repositories);
    if !stats.most_active_repo.is_empty() {
        let _ = writeln!(
            out,
            "- Most active: {} ({} commits)",
            stats.most_active_repo, stats.max_commits
        );
    }

    out.push_str("\n## Commits\n\n");
    for repo in selected_repos(commits, selected) {
        let _ = writeln!(out, "### {repo}\n");
        for commit in &commits.by_repo[repo] {
            let _ = writeln!(out, "- {}", commit.message);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "---");
    let _ = writeln!(out, "_Generated at {}_", Utc::now().to_rfc3339());
    out
}

pub fn render_json(
    commits: &CommitSet,
    selected: &HashMap<String, bool>,
    date_label: &str,
    stats: &Statistics,
) -> Result<String> {
    let mut grouped: BTreeMap<&str, &[Commit]> = BTreeMap::new();
    let mut total_commits = 0;
    for repo in selected_repos(commits, selected) {
        let repo_commits = commits.by_repo[repo].as_slice();
        total_commits += repo_commits.len();
        grouped.insert(repo.as_str(), repo_commits);
    }

    let export = SummaryExport {
        date: date_label,
        total_repos: grouped.len(),
        total_commits,
        commits: grouped,
        stats,
        generated_at: Utc::now().to_rfc3339(),
    };

    Ok(serde_json::to_string_pretty(&export)?)
}

pub fn render(
    format: ExportFormat,
    commits: &CommitSet,
    selected: &HashMap<String, bool>,
    date_label: &str,
    stats: &Statistics,
    template: Option<&str>,
) -> Result<String> {
    match format {
        ExportFormat::Text => match template.filter(|t| !t.is_empty()) {
            Some(template) => Ok(render_template(template, commits, selected, date_label, stats)),
            None => Ok(render_text(commits, selected, date_label, stats)),
        },
        ExportFormat::Markdown => Ok(render_markdown(commits, selected, date_label, stats)),
        ExportFormat::Json => render_json(commits, selected, date_label, stats),
    }
}

/// Deterministic output filename for a range and format.
pub fn filename(range: &DateRange, format: ExportFormat) -> String {
    let date = if range.start == range.end {
        range.start.format(DATE_FORMAT).to_string()
    } else {
        format!(
            "{}_{}",
            range.start.format(DATE_FORMAT),
            range.end.format(DATE_FORMAT)
        )
    };
    format!("commits-{date}.{}", format.extension())
}

pub fn save(content: &str, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path.as_ref(), content).map_err(|e| {
        ShiplogError::Export(format!("failed to write {}: {e}", path.as_ref().display()))
    })
}
