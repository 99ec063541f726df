use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, ShiplogError};

/// How many results the commit search asks for; hitting it means truncation.
pub const FETCH_LIMIT: usize = 1000;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub repository: String,
    /// First line of the commit message.
    pub message: String,
}

/// Commits grouped by repository for one fetched date range.
///
/// `repo_list` is always the sorted, duplicate-free key set of `by_repo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitSet {
    pub by_repo: HashMap<String, Vec<Commit>>,
    pub repo_list: Vec<String>,
    pub warning: Option<String>,
}

impl CommitSet {
    pub fn from_commits(by_repo: HashMap<String, Vec<Commit>>, warning: Option<String>) -> Self {
        let mut repo_list: Vec<String> = by_repo.keys().cloned().collect();
        repo_list.sort();
        Self {
            by_repo,
            repo_list,
            warning,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.repo_list.is_empty()
    }

    pub fn commit_count(&self, repo: &str) -> usize {
        self.by_repo.get(repo).map_or(0, Vec::len)
    }

    pub fn total_commits(&self) -> usize {
        self.by_repo.values().map(Vec::len).sum()
    }
}

/// Inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Query string handed to the commit source: a single date, or
    /// `start..end` when the range spans more than one day.
    pub fn query(&self) -> String {
        if self.start == self.end {
            self.start.format(DATE_FORMAT).to_string()
        } else {
            format!(
                "{}..{}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }

    /// Human-readable label: the date itself, or a two-sided span.
    pub fn display(&self) -> String {
        if self.start == self.end {
            self.start.format(DATE_FORMAT).to_string()
        } else {
            format!(
                "{} → {}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.start == today && self.end == today
    }

    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.start > self.end {
            return Err(ShiplogError::InvalidDate(
                "start date cannot be after end date".into(),
            ));
        }
        if self.end > today {
            return Err(ShiplogError::InvalidDate(
                "date cannot be in the future".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a user-entered `YYYY-MM-DD` date, rejecting future dates.
pub fn parse_input_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| ShiplogError::InvalidDate("invalid date format, use YYYY-MM-DD".into()))?;
    if date > today {
        return Err(ShiplogError::InvalidDate(
            "date cannot be in the future".into(),
        ));
    }
    Ok(date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    Custom,
}

impl DatePreset {
    pub const ALL: [DatePreset; 5] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::LastWeek,
        DatePreset::LastMonth,
        DatePreset::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DatePreset::Today => "Today",
            DatePreset::Yesterday => "Yesterday",
            DatePreset::LastWeek => "Last 7 days",
            DatePreset::LastMonth => "Last 30 days",
            DatePreset::Custom => "Custom date",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::LastWeek => "week",
            DatePreset::LastMonth => "month",
            DatePreset::Custom => "custom",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.key() == key)
    }

    /// Resolve the preset against `today`. `Custom` has no fixed range.
    pub fn resolve(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            DatePreset::Today => Some(DateRange::single(today)),
            DatePreset::Yesterday => Some(DateRange::single(today - chrono::Days::new(1))),
            DatePreset::LastWeek => Some(DateRange::new(today - chrono::Days::new(7), today)),
            DatePreset::LastMonth => Some(DateRange::new(today - chrono::Days::new(30), today)),
            DatePreset::Custom => None,
        }
    }
}

/// Statistics over the selected repositories of one CommitSet.
///
/// Field names form the JSON export contract; keep them stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_commits: usize,
    pub total_repositories: usize,
    pub commits_per_repo: HashMap<String, usize>,
    pub most_active_repo: String,
    pub max_commits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Markdown,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] =
        [ExportFormat::Text, ExportFormat::Markdown, ExportFormat::Json];

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Text => "Text",
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Json => "JSON",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExportFormat::Text => "Plain text format (.txt)",
            ExportFormat::Markdown => "Markdown format (.md)",
            ExportFormat::Json => "JSON format (.json)",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "text" => Some(ExportFormat::Text),
            "markdown" => Some(ExportFormat::Markdown),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}
