use chrono::NaiveDate;
use std::collections::HashMap;

use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::error::Result;
use crate::model::{
    CommitSet, DatePreset, DateRange, ExportFormat, Statistics, DATE_FORMAT,
};
use crate::retriever::CancelToken;
use crate::{export, filter, stats};

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    DateRangeSelect,
    CustomDateEntry,
    RepoFilterEntry,
    RepoList,
    Summary,
    ExportFormatSelect,
    Statistics,
    Loading,
}

/// Session state for the interactive screens.
///
/// Owns all mutable session data; the event loop feeds it key events and
/// fetch completions, and the views render from it without mutating.
pub struct App {
    pub screen: Screen,
    pub today: NaiveDate,
    pub config: Config,

    pub commits: CommitSet,
    pub filtered_repos: Vec<String>,
    pub filter_active: bool,

    /// Selection may hold stale repos after a refetch; consumers intersect
    /// with the current repo list before acting.
    pub selected: HashMap<String, bool>,
    pub cursor: usize,

    pub date_input: String,
    pub filter_input: String,

    pub preset_idx: usize,
    pub range: DateRange,

    pub format_idx: usize,

    pub stats: Option<Statistics>,
    /// Screen that opened the statistics view.
    pub stats_return: Screen,

    /// Load-failure banner; sticks until the next fetch or retry.
    pub error: Option<String>,
    /// Inline validation error next to a text input.
    pub input_error: Option<String>,
    /// Transient message, cleared on the next key event.
    pub message: Option<String>,

    pub spinner_idx: usize,
    /// Fetch generation; completions for older generations are ignored.
    pub generation: u64,
    pub cancel: CancelToken,

    pub clipboard: Box<dyn Clipboard>,
}

impl App {
    pub fn new(config: Config, clipboard: Box<dyn Clipboard>, today: NaiveDate) -> Self {
        let preset_idx = DatePreset::from_key(&config.default_date_range)
            .and_then(|p| DatePreset::ALL.iter().position(|q| *q == p))
            .unwrap_or(0);
        let format_idx = ExportFormat::from_key(&config.output_format)
            .and_then(|f| ExportFormat::ALL.iter().position(|g| *g == f))
            .unwrap_or(0);
        let filter_input = config.repo_filter.clone();

        Self {
            screen: Screen::DateRangeSelect,
            today,
            config,
            commits: CommitSet::default(),
            filtered_repos: Vec::new(),
            filter_active: false,
            selected: HashMap::new(),
            cursor: 0,
            date_input: today.format(DATE_FORMAT).to_string(),
            filter_input,
            preset_idx,
            range: DateRange::single(today),
            format_idx,
            stats: None,
            stats_return: Screen::RepoList,
            error: None,
            input_error: None,
            message: None,
            spinner_idx: 0,
            generation: 0,
            cancel: CancelToken::new(),
            clipboard,
        }
    }

    /// Repos currently shown: the filtered subset when a filter is active.
    pub fn display_repos(&self) -> &[String] {
        if self.filter_active {
            &self.filtered_repos
        } else {
            &self.commits.repo_list
        }
    }

    pub fn selected_format(&self) -> ExportFormat {
        ExportFormat::ALL[self.format_idx]
    }

    pub fn compute_stats(&self) -> Statistics {
        stats::compute(&self.commits, &self.selected)
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_idx = (self.spinner_idx + 1) % SPINNER_FRAMES.len();
    }

    /// Enter the loading screen for `range`, invalidating any outstanding
    /// fetch by bumping the generation and issuing a fresh cancel token.
    pub fn begin_loading(&mut self, range: DateRange) {
        self.range = range;
        self.generation += 1;
        self.cancel = CancelToken::new();
        self.error = None;
        self.input_error = None;
        self.screen = Screen::Loading;
    }

    /// Abandon the in-flight fetch and return to date selection.
    pub fn cancel_loading(&mut self) {
        self.cancel.cancel();
        self.generation += 1;
        self.error = None;
        self.screen = Screen::DateRangeSelect;
    }

    /// Apply a completed fetch. Stale generations and completions arriving
    /// outside the loading screen are dropped.
    pub fn on_fetch_complete(&mut self, generation: u64, outcome: Result<CommitSet>) {
        if generation != self.generation || self.screen != Screen::Loading {
            return;
        }

        match outcome {
            Ok(set) => {
                self.commits = set;
                self.error = None;
            }
            Err(e) => {
                self.commits = CommitSet::default();
                self.error = Some(e.to_string());
            }
        }

        self.selected.clear();
        self.cursor = 0;
        self.stats = None;
        self.recompute_filter();
        self.screen = Screen::RepoList;
    }

    /// Re-derive the displayed subset from the current filter input.
    pub fn recompute_filter(&mut self) {
        if self.filter_input.is_empty() {
            self.filter_active = false;
            self.filtered_repos = self.commits.repo_list.clone();
        } else {
            self.filter_active = true;
            self.filtered_repos =
                filter::filter_repos(&self.commits.repo_list, &self.filter_input);
        }
    }

    /// Render the current selection in `format`, honoring the configured
    /// text template.
    pub fn render_export(&self, format: ExportFormat) -> Result<String> {
        let stats = self.compute_stats();
        let template = (!self.config.custom_template.is_empty())
            .then_some(self.config.custom_template.as_str());
        export::render(
            format,
            &self.commits,
            &self.selected,
            &self.range.display(),
            &stats,
            template,
        )
    }

    /// Copy the text rendering of the current selection to the clipboard,
    /// reporting the result as a transient message.
    pub fn copy_summary(&mut self, format: ExportFormat) {
        let content = match self.render_export(format) {
            Ok(content) => content,
            Err(e) => {
                self.message = Some(format!("Failed to generate content: {e}"));
                return;
            }
        };
        match self.clipboard.copy(&content) {
            Ok(()) => self.message = Some("Copied to clipboard!".to_string()),
            Err(e) => self.message = Some(format!("Failed to copy: {e}")),
        }
    }
}
