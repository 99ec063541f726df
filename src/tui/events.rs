use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

use crate::model::{DatePreset, ExportFormat};
use crate::{export, model};

use super::state::{App, Screen};

const DATE_INPUT_LIMIT: usize = 10;
const FILTER_INPUT_LIMIT: usize = 50;

/// What the event loop should do after a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
    /// A fetch for `app.range` under `app.generation` must be spawned.
    StartFetch,
}

/// Route one key press to the active screen's handler.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Outcome {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Outcome::Quit;
    }

    // Transient messages live until the next key event.
    app.message = None;

    match app.screen {
        Screen::DateRangeSelect => date_range_select(app, key),
        Screen::CustomDateEntry => custom_date_entry(app, key),
        Screen::RepoFilterEntry => repo_filter_entry(app, key),
        Screen::RepoList => repo_list(app, key),
        Screen::Summary => summary(app, key),
        Screen::ExportFormatSelect => export_format_select(app, key),
        Screen::Statistics => statistics(app, key),
        Screen::Loading => loading(app, key),
    }
}

fn date_range_select(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Outcome::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            if app.preset_idx + 1 < DatePreset::ALL.len() {
                app.preset_idx += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.preset_idx = app.preset_idx.saturating_sub(1);
        }
        KeyCode::Enter => {
            let preset = DatePreset::ALL[app.preset_idx];
            match preset.resolve(app.today) {
                Some(range) => {
                    debug!("preset {} confirmed: {}", preset.key(), range.display());
                    app.begin_loading(range);
                    return Outcome::StartFetch;
                }
                None => {
                    app.input_error = None;
                    app.screen = Screen::CustomDateEntry;
                }
            }
        }
        _ => {}
    }
    Outcome::Continue
}

fn custom_date_entry(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Enter => match model::parse_input_date(&app.date_input, app.today) {
            Ok(date) => {
                app.begin_loading(crate::model::DateRange::single(date));
                return Outcome::StartFetch;
            }
            Err(e) => app.input_error = Some(e.to_string()),
        },
        KeyCode::Esc => {
            app.input_error = None;
            app.screen = Screen::DateRangeSelect;
        }
        KeyCode::Backspace => {
            app.date_input.pop();
            app.input_error = None;
        }
        KeyCode::Char(c) => {
            if app.date_input.chars().count() < DATE_INPUT_LIMIT {
                app.date_input.push(c);
            }
            app.input_error = None;
        }
        _ => {}
    }
    Outcome::Continue
}

fn repo_filter_entry(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Enter => {
            app.recompute_filter();
            app.cursor = 0;
            app.screen = Screen::RepoList;
        }
        KeyCode::Esc => {
            app.filter_input.clear();
            app.recompute_filter();
            app.cursor = 0;
            app.screen = Screen::RepoList;
        }
        KeyCode::Backspace => {
            app.filter_input.pop();
        }
        KeyCode::Char(c) => {
            if app.filter_input.chars().count() < FILTER_INPUT_LIMIT {
                app.filter_input.push(c);
            }
        }
        _ => {}
    }
    Outcome::Continue
}

fn repo_list(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Char('q') => return Outcome::Quit,
        KeyCode::Enter => {
            app.stats = Some(app.compute_stats());
            app.screen = Screen::Summary;
            if app.config.auto_copy {
                app.copy_summary(ExportFormat::Text);
            }
        }
        KeyCode::Char(' ') => {
            let repo = app.display_repos().get(app.cursor).cloned();
            if let Some(repo) = repo {
                let entry = app.selected.entry(repo).or_insert(false);
                *entry = !*entry;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.cursor + 1 < app.display_repos().len() {
                app.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Char('a') => {
            let repos: Vec<String> = app.display_repos().to_vec();
            for repo in repos {
                app.selected.insert(repo, true);
            }
        }
        KeyCode::Char('n') => {
            let repos: Vec<String> = app.display_repos().to_vec();
            for repo in repos {
                app.selected.insert(repo, false);
            }
        }
        KeyCode::Char('f') | KeyCode::Char('/') => {
            app.screen = Screen::RepoFilterEntry;
        }
        KeyCode::Char('s') => {
            app.stats = Some(app.compute_stats());
            app.stats_return = Screen::RepoList;
            app.screen = Screen::Statistics;
        }
        KeyCode::Char('r') => {
            app.error = None;
            app.cursor = 0;
            app.screen = Screen::DateRangeSelect;
        }
        _ => {}
    }
    Outcome::Continue
}

fn summary(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Char('q') => return Outcome::Quit,
        KeyCode::Esc | KeyCode::Char('b') => app.screen = Screen::RepoList,
        KeyCode::Char('c') => app.copy_summary(ExportFormat::Text),
        KeyCode::Char('e') => app.screen = Screen::ExportFormatSelect,
        KeyCode::Char('s') => {
            app.stats = Some(app.compute_stats());
            app.stats_return = Screen::Summary;
            app.screen = Screen::Statistics;
        }
        _ => {}
    }
    Outcome::Continue
}

fn export_format_select(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Char('q') => return Outcome::Quit,
        KeyCode::Esc | KeyCode::Char('b') => app.screen = Screen::Summary,
        KeyCode::Char('j') | KeyCode::Down => {
            if app.format_idx + 1 < ExportFormat::ALL.len() {
                app.format_idx += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.format_idx = app.format_idx.saturating_sub(1);
        }
        KeyCode::Enter => {
            let format = app.selected_format();
            match app.render_export(format) {
                Ok(content) => {
                    let filename = export::filename(&app.range, format);
                    match export::save(&content, &filename) {
                        Ok(()) => app.message = Some(format!("Saved to {filename}")),
                        Err(e) => app.message = Some(format!("Failed to save: {e}")),
                    }
                }
                Err(e) => app.message = Some(format!("Failed to generate content: {e}")),
            }
            app.screen = Screen::Summary;
        }
        KeyCode::Char('c') => {
            let format = app.selected_format();
            app.copy_summary(format);
        }
        _ => {}
    }
    Outcome::Continue
}

fn statistics(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Char('q') => return Outcome::Quit,
        KeyCode::Esc | KeyCode::Char('b') => app.screen = app.stats_return,
        _ => {}
    }
    Outcome::Continue
}

fn loading(app: &mut App, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Char('q') => return Outcome::Quit,
        KeyCode::Esc => app.cancel_loading(),
        _ => {}
    }
    Outcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use crate::config::Config;
    use crate::error::{Result, ShiplogError};
    use crate::model::{Commit, CommitSet, DATE_FORMAT};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeClipboard {
        copied: Rc<RefCell<Vec<String>>>,
    }

    impl Clipboard for FakeClipboard {
        fn copy(&self, text: &str) -> Result<()> {
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn app() -> App {
        App::new(Config::default(), Box::<FakeClipboard>::default(), today())
    }

    fn app_with_clipboard() -> (App, Rc<RefCell<Vec<String>>>) {
        let copied = Rc::new(RefCell::new(Vec::new()));
        let clipboard = FakeClipboard {
            copied: Rc::clone(&copied),
        };
        (
            App::new(Config::default(), Box::new(clipboard), today()),
            copied,
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample_set() -> CommitSet {
        let mut by_repo = HashMap::new();
        for (repo, n) in [("org/alpha", 3usize), ("org/beta", 2), ("other/tool", 1)] {
            by_repo.insert(
                repo.to_string(),
                (0..n)
                    .map(|i| Commit {
                        repository: repo.to_string(),
                        message: format!("commit {i}"),
                    })
                    .collect(),
            );
        }
        CommitSet::from_commits(by_repo, None)
    }

    fn loaded_app() -> App {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Enter));
        let generation = app.generation;
        app.on_fetch_complete(generation, Ok(sample_set()));
        app
    }

    #[test]
    fn starts_on_date_range_select() {
        let app = app();
        assert_eq!(app.screen, Screen::DateRangeSelect);
        assert_eq!(app.date_input, today().format(DATE_FORMAT).to_string());
    }

    #[test]
    fn confirming_a_preset_starts_a_fetch() {
        let mut app = app();
        let outcome = handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(outcome, Outcome::StartFetch);
        assert_eq!(app.screen, Screen::Loading);
        assert_eq!(app.range.display(), "2026-08-06");
        assert_eq!(app.generation, 1);
    }

    #[test]
    fn confirming_custom_opens_date_entry() {
        let mut app = app();
        for _ in 0..4 {
            handle_key(&mut app, key(KeyCode::Char('j')));
        }
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), Outcome::Continue);
        assert_eq!(app.screen, Screen::CustomDateEntry);
    }

    #[test]
    fn preset_cursor_clamps_at_both_ends() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.preset_idx, 0);
        for _ in 0..10 {
            handle_key(&mut app, key(KeyCode::Char('j')));
        }
        assert_eq!(app.preset_idx, DatePreset::ALL.len() - 1);
    }

    #[test]
    fn valid_custom_date_is_accepted() {
        let mut app = app();
        app.screen = Screen::CustomDateEntry;
        app.date_input = "2026-02-02".to_string();
        let outcome = handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(outcome, Outcome::StartFetch);
        assert_eq!(app.screen, Screen::Loading);
        assert_eq!(app.range.display(), "2026-02-02");
    }

    #[test]
    fn future_custom_date_is_rejected_inline() {
        let mut app = app();
        app.screen = Screen::CustomDateEntry;
        app.date_input = "2099-01-01".to_string();
        let outcome = handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(app.screen, Screen::CustomDateEntry);
        assert!(app.input_error.as_deref().unwrap().contains("future"));
    }

    #[test]
    fn editing_the_date_clears_the_inline_error() {
        let mut app = app();
        app.screen = Screen::CustomDateEntry;
        app.date_input = "bogus".to_string();
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.input_error.is_some());
        handle_key(&mut app, key(KeyCode::Backspace));
        assert!(app.input_error.is_none());
    }

    #[test]
    fn escaping_custom_entry_returns_to_presets() {
        let mut app = app();
        app.screen = Screen::CustomDateEntry;
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::DateRangeSelect);
    }

    #[test]
    fn successful_load_lands_on_repo_list() {
        let app = loaded_app();
        assert_eq!(app.screen, Screen::RepoList);
        assert_eq!(app.cursor, 0);
        assert!(app.selected.is_empty());
        assert_eq!(
            app.display_repos(),
            ["org/alpha", "org/beta", "other/tool"]
        );
    }

    #[test]
    fn failed_load_shows_an_error_banner() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Enter));
        let generation = app.generation;
        app.on_fetch_complete(generation, Err(ShiplogError::RateLimit));
        assert_eq!(app.screen, Screen::RepoList);
        assert!(app.commits.is_empty());
        assert!(app.error.as_deref().unwrap().contains("rate limit"));
    }

    #[test]
    fn cancelling_loading_returns_to_date_select_and_drops_late_results() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Enter));
        let stale = app.generation;
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::DateRangeSelect);
        assert!(app.cancel.is_cancelled());

        app.on_fetch_complete(stale, Ok(sample_set()));
        assert_eq!(app.screen, Screen::DateRangeSelect);
        assert!(app.commits.is_empty());
    }

    #[test]
    fn space_toggles_selection_under_cursor() {
        let mut app = loaded_app();
        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.selected.get("org/alpha"), Some(&true));
        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.selected.get("org/alpha"), Some(&false));
    }

    #[test]
    fn cursor_is_clamped_to_list_bounds() {
        let mut app = loaded_app();
        for _ in 0..10 {
            handle_key(&mut app, key(KeyCode::Char('j')));
        }
        assert_eq!(app.cursor, 2);
        for _ in 0..10 {
            handle_key(&mut app, key(KeyCode::Char('k')));
        }
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn select_all_covers_only_the_displayed_subset() {
        let mut app = loaded_app();
        app.filter_input = "org/*".to_string();
        app.recompute_filter();
        assert_eq!(app.display_repos(), ["org/alpha", "org/beta"]);

        handle_key(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.selected.get("org/alpha"), Some(&true));
        assert_eq!(app.selected.get("org/beta"), Some(&true));
        assert_eq!(app.selected.get("other/tool"), None);

        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.selected.get("org/alpha"), Some(&false));
    }

    #[test]
    fn filter_entry_applies_and_clears() {
        let mut app = loaded_app();
        handle_key(&mut app, key(KeyCode::Char('/')));
        assert_eq!(app.screen, Screen::RepoFilterEntry);
        for c in "beta".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::RepoList);
        assert_eq!(app.display_repos(), ["org/beta"]);

        handle_key(&mut app, key(KeyCode::Char('/')));
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.filter_active);
        assert_eq!(app.display_repos().len(), 3);
    }

    #[test]
    fn empty_filter_confirm_restores_the_full_list() {
        let mut app = loaded_app();
        app.filter_input = "beta".to_string();
        app.recompute_filter();
        handle_key(&mut app, key(KeyCode::Char('/')));
        for _ in 0..4 {
            handle_key(&mut app, key(KeyCode::Backspace));
        }
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(!app.filter_active);
        assert_eq!(app.display_repos().len(), 3);
    }

    #[test]
    fn confirming_repo_list_computes_stats_and_opens_summary() {
        let mut app = loaded_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Summary);
        let stats = app.stats.as_ref().unwrap();
        assert_eq!(stats.total_commits, 6);
        assert_eq!(stats.total_repositories, 3);
        assert_eq!(stats.most_active_repo, "org/alpha");
    }

    #[test]
    fn summary_copy_goes_through_the_clipboard() {
        let (mut app, copied) = app_with_clipboard();
        handle_key(&mut app, key(KeyCode::Enter));
        let generation = app.generation;
        app.on_fetch_complete(generation, Ok(sample_set()));
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Enter));

        handle_key(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.message.as_deref(), Some("Copied to clipboard!"));
        let copied = copied.borrow();
        assert_eq!(copied.len(), 1);
        assert!(copied[0].contains("[org/alpha]:"));
    }

    #[test]
    fn statistics_returns_to_its_invoker() {
        let mut app = loaded_app();
        handle_key(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.screen, Screen::Statistics);
        handle_key(&mut app, key(KeyCode::Char('b')));
        assert_eq!(app.screen, Screen::RepoList);

        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Char('s')));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Summary);
    }

    #[test]
    fn export_format_cycles_and_copies_without_saving() {
        let (mut app, copied) = app_with_clipboard();
        handle_key(&mut app, key(KeyCode::Enter));
        let generation = app.generation;
        app.on_fetch_complete(generation, Ok(sample_set()));
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.screen, Screen::ExportFormatSelect);

        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.selected_format(), ExportFormat::Json);
        handle_key(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.selected_format(), ExportFormat::Json);

        handle_key(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.screen, Screen::ExportFormatSelect);
        let copied = copied.borrow();
        assert!(copied[0].trim_start().starts_with('{'));
    }

    #[test]
    fn auto_copy_fires_on_entering_summary() {
        let copied = Rc::new(RefCell::new(Vec::new()));
        let clipboard = FakeClipboard {
            copied: Rc::clone(&copied),
        };
        let config = Config {
            auto_copy: true,
            ..Config::default()
        };
        let mut app = App::new(config, Box::new(clipboard), today());
        handle_key(&mut app, key(KeyCode::Enter));
        let generation = app.generation;
        app.on_fetch_complete(generation, Ok(sample_set()));
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(copied.borrow().len(), 1);
    }

    #[test]
    fn configured_repo_filter_applies_after_load() {
        let config = Config {
            repo_filter: "org/*".to_string(),
            ..Config::default()
        };
        let mut app = App::new(config, Box::<FakeClipboard>::default(), today());
        handle_key(&mut app, key(KeyCode::Enter));
        let generation = app.generation;
        app.on_fetch_complete(generation, Ok(sample_set()));
        assert!(app.filter_active);
        assert_eq!(app.display_repos(), ["org/alpha", "org/beta"]);
    }

    #[test]
    fn transient_message_clears_on_next_key() {
        let mut app = loaded_app();
        app.message = Some("Saved to somewhere".to_string());
        handle_key(&mut app, key(KeyCode::Char('j')));
        assert!(app.message.is_none());
    }

    #[test]
    fn quit_works_from_every_screen() {
        for screen in [
            Screen::DateRangeSelect,
            Screen::RepoList,
            Screen::Summary,
            Screen::ExportFormatSelect,
            Screen::Statistics,
            Screen::Loading,
        ] {
            let mut app = app();
            app.screen = screen;
            assert_eq!(
                handle_key(&mut app, key(KeyCode::Char('q'))),
                Outcome::Quit,
                "q should quit from {screen:?}"
            );
        }

        let mut app = app();
        app.screen = Screen::CustomDateEntry;
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut app, ctrl_c), Outcome::Quit);
    }
}
