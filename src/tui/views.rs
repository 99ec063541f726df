use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::model::{DatePreset, ExportFormat, Statistics};

use super::state::{App, Screen, SPINNER_FRAMES};

const CHECKED: &str = "●";
const UNCHECKED: &str = "○";
const CURSOR: &str = "➜ ";
const STAT_BAR_WIDTH: usize = 25;

fn title_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn repo_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn dim_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn cursor_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

fn warning_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn success_style() -> Style {
    Style::default().fg(Color::Green)
}

fn help_line(items: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, label)) in items.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  •  ", dim_style()));
        }
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(format!(" {label}"), dim_style()));
    }
    Line::from(spans)
}

fn screen_title(screen: Screen) -> &'static str {
    match screen {
        Screen::DateRangeSelect => "Select Time Range",
        Screen::CustomDateEntry => "Custom Date",
        Screen::RepoFilterEntry => "Filter Repositories",
        Screen::RepoList => "Repositories",
        Screen::Summary => "Summary",
        Screen::ExportFormatSelect => "Export Summary",
        Screen::Statistics => "Statistics",
        Screen::Loading => "Loading",
    }
}

/// Render the active screen into the full frame.
pub fn draw(f: &mut Frame, app: &App) {
    let lines = match app.screen {
        Screen::DateRangeSelect => date_range_select(app),
        Screen::CustomDateEntry => custom_date_entry(app),
        Screen::RepoFilterEntry => repo_filter_entry(app),
        Screen::RepoList => repo_list(app),
        Screen::Summary => summary(app),
        Screen::ExportFormatSelect => export_format_select(app),
        Screen::Statistics => statistics(app),
        Screen::Loading => loading(app),
    };

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" shiplog · {} ", screen_title(app.screen)),
        title_style(),
    ));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    let area: Rect = f.size();
    f.render_widget(paragraph, area);
}

fn date_range_select(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from("Choose a preset or custom date range:"),
        Line::default(),
    ];

    for (i, preset) in DatePreset::ALL.iter().enumerate() {
        let mut spans = Vec::new();
        if i == app.preset_idx {
            spans.push(Span::styled(CURSOR, cursor_style()));
        } else {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(preset.label().to_string(), repo_style()));
        if let Some(range) = preset.resolve(app.today) {
            spans.push(Span::styled(format!("  ({})", range.display()), dim_style()));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines.push(help_line(&[("j/k", "navigate"), ("enter", "select"), ("q", "quit")]));
    lines
}

fn custom_date_entry(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(err) = &app.input_error {
        lines.push(Line::from(Span::styled(format!("✗ {err}"), error_style())));
        lines.push(Line::default());
    }

    lines.push(Line::from("Enter custom date:"));
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::raw("  > "),
        Span::styled(app.date_input.clone(), repo_style()),
        Span::styled("▏", cursor_style()),
    ]));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Format: YYYY-MM-DD (e.g. 2026-02-02)",
        dim_style(),
    )));
    lines.push(Line::default());
    lines.push(help_line(&[("enter", "confirm"), ("esc", "back")]));
    lines
}

fn repo_filter_entry(app: &App) -> Vec<Line<'static>> {
    vec![
        Line::from("Enter filter pattern:"),
        Line::default(),
        Line::from(vec![
            Span::raw("  > "),
            Span::styled(app.filter_input.clone(), repo_style()),
            Span::styled("▏", cursor_style()),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "Use * as wildcard (e.g. *project* or org/*)",
            dim_style(),
        )),
        Line::default(),
        help_line(&[("enter", "apply"), ("esc", "cancel")]),
    ]
}

fn repo_list(app: &App) -> Vec<Line<'static>> {
    if let Some(err) = &app.error {
        return vec![
            Line::from(Span::styled(format!("✗ {err}"), error_style())),
            Line::default(),
            help_line(&[("r", "change date"), ("q", "quit")]),
        ];
    }

    let repos = app.display_repos();
    if repos.is_empty() {
        let what = if app.filter_active {
            format!("No repositories match '{}'", app.filter_input)
        } else {
            format!("No commits found for {}", app.range.display())
        };
        let mut lines = vec![Line::from(Span::styled(what, dim_style())), Line::default()];
        if app.filter_active {
            lines.push(help_line(&[("f", "change filter"), ("r", "change date"), ("q", "quit")]));
        } else {
            lines.push(help_line(&[("r", "change date"), ("q", "quit")]));
        }
        return lines;
    }

    let total: usize = repos.iter().map(|r| app.commits.commit_count(r)).sum();
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("Commits for {}", app.range.display()), title_style()),
            Span::styled(
                format!("   {} repositories · {} commits", repos.len(), total),
                dim_style(),
            ),
        ]),
        Line::default(),
    ];

    if app.filter_active {
        lines.push(Line::from(Span::styled(
            format!("Filter: {}", app.filter_input),
            dim_style(),
        )));
        lines.push(Line::default());
    }
    if let Some(warning) = &app.commits.warning {
        lines.push(Line::from(Span::styled(format!("⚠ {warning}"), warning_style())));
        lines.push(Line::default());
    }

    for (i, repo) in repos.iter().enumerate() {
        let selected = app.selected.get(repo).copied().unwrap_or(false);
        let checkbox = if selected { CHECKED } else { UNCHECKED };
        let mut spans = Vec::new();
        if i == app.cursor {
            spans.push(Span::styled(CURSOR, cursor_style()));
        } else {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(checkbox.to_string(), success_style()));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(repo.clone(), repo_style()));
        spans.push(Span::styled(
            format!(" ({})", app.commits.commit_count(repo)),
            dim_style(),
        ));
        lines.push(Line::from(spans));

        if selected {
            for commit in app.commits.by_repo.get(repo).into_iter().flatten() {
                lines.push(Line::from(vec![
                    Span::raw("      "),
                    Span::styled("• ", success_style()),
                    Span::raw(commit.message.clone()),
                ]));
            }
        }
    }

    if let Some(message) = &app.message {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(format!("✓ {message}"), success_style())));
    }

    lines.push(Line::default());
    lines.push(help_line(&[
        ("space", "select"),
        ("a/n", "all/none"),
        ("f", "filter"),
        ("s", "stats"),
        ("enter", "summary"),
        ("r", "new range"),
        ("q", "quit"),
    ]));
    lines
}

fn summary(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Summary for {}", app.range.display()),
            title_style(),
        )),
        Line::default(),
    ];

    let selected: Vec<&String> = app
        .commits
        .repo_list
        .iter()
        .filter(|r| app.selected.get(*r).copied().unwrap_or(false))
        .collect();

    if selected.is_empty() {
        lines.push(Line::from(Span::styled("No repositories selected.", dim_style())));
        lines.push(Line::default());
    } else {
        for repo in &selected {
            lines.push(Line::from(Span::styled(format!("▸ {repo}"), repo_style())));
            for commit in app.commits.by_repo.get(*repo).into_iter().flatten() {
                lines.push(Line::from(vec![
                    Span::raw("   "),
                    Span::styled("• ", success_style()),
                    Span::raw(commit.message.clone()),
                ]));
            }
            lines.push(Line::default());
        }
    }

    if app.config.show_stats {
        if let Some(stats) = &app.stats {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} commits across {} repositories",
                    stats.total_commits, stats.total_repositories
                ),
                dim_style(),
            )));
            lines.push(Line::default());
        }
    }

    if let Some(message) = &app.message {
        lines.push(Line::from(Span::styled(format!("✓ {message}"), success_style())));
        lines.push(Line::default());
    }

    lines.push(help_line(&[
        ("c", "copy"),
        ("e", "export"),
        ("s", "stats"),
        ("b", "back"),
        ("q", "quit"),
    ]));
    lines
}

fn export_format_select(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("Select export format:"), Line::default()];

    for (i, format) in ExportFormat::ALL.iter().enumerate() {
        let mut spans = Vec::new();
        if i == app.format_idx {
            spans.push(Span::styled(CURSOR, cursor_style()));
        } else {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format.label().to_string(), repo_style()));
        spans.push(Span::styled(format!("  {}", format.description()), dim_style()));
        lines.push(Line::from(spans));
    }

    if let Some(message) = &app.message {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(format!("✓ {message}"), success_style())));
    }

    lines.push(Line::default());
    lines.push(help_line(&[
        ("enter", "save file"),
        ("c", "copy"),
        ("b", "back"),
    ]));
    lines
}

/// Proportional bar for per-repo counts; at least one cell when non-zero.
fn stat_bar(count: usize, max: usize) -> String {
    if max == 0 {
        return "░".repeat(STAT_BAR_WIDTH);
    }
    let mut filled = count * STAT_BAR_WIDTH / max;
    if count > 0 && filled == 0 {
        filled = 1;
    }
    format!("{}{}", "█".repeat(filled), "░".repeat(STAT_BAR_WIDTH - filled))
}

fn bar_color(count: usize, max: usize) -> Style {
    if max == 0 {
        return Style::default().fg(Color::White);
    }
    let ratio = count as f64 / max as f64;
    if ratio > 0.8 {
        Style::default().fg(Color::Red)
    } else if ratio > 0.5 {
        Style::default().fg(Color::Yellow)
    } else if ratio > 0.25 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

fn statistics(app: &App) -> Vec<Line<'static>> {
    let Some(stats) = &app.stats else {
        return vec![
            Line::from(Span::styled("No statistics available", dim_style())),
            Line::default(),
            help_line(&[("b", "back"), ("q", "quit")]),
        ];
    };

    let mut lines = vec![
        stat_line("Total commits:      ", stats.total_commits.to_string()),
        stat_line("Total repositories: ", stats.total_repositories.to_string()),
    ];
    if !stats.most_active_repo.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Most active:        ".to_string(), dim_style()),
            Span::styled(stats.most_active_repo.clone(), repo_style()),
            Span::styled(format!(" ({} commits)", stats.max_commits), dim_style()),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from("Commits per repository:"));
    lines.push(Line::default());
    lines.extend(per_repo_bars(stats));

    lines.push(Line::default());
    lines.push(help_line(&[("b", "back"), ("q", "quit")]));
    lines
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, dim_style()),
        Span::styled(value, title_style()),
    ])
}

fn per_repo_bars(stats: &Statistics) -> Vec<Line<'static>> {
    let width = stats
        .commits_per_repo
        .keys()
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0);

    // Sorted so the layout is stable between redraws.
    let mut repos: Vec<(&String, &usize)> = stats.commits_per_repo.iter().collect();
    repos.sort_by(|a, b| a.0.cmp(b.0));

    repos
        .into_iter()
        .map(|(repo, count)| {
            let pct = if stats.total_commits > 0 {
                count * 100 / stats.total_commits
            } else {
                0
            };
            Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{repo:width$}"), repo_style()),
                Span::raw(" "),
                Span::styled(
                    stat_bar(*count, stats.max_commits),
                    bar_color(*count, stats.max_commits),
                ),
                Span::styled(format!(" {count:>3} ({pct:>2}%)"), dim_style()),
            ])
        })
        .collect()
}

fn loading(app: &App) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(
                SPINNER_FRAMES[app.spinner_idx].to_string(),
                cursor_style(),
            ),
            Span::raw(format!(" Fetching commits for {}...", app.range.display())),
        ]),
        Line::default(),
        Line::from(Span::styled("Querying GitHub", dim_style())),
        Line::default(),
        help_line(&[("esc", "cancel"), ("q", "quit")]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bars_scale_proportionally_with_a_floor_of_one() {
        assert_eq!(stat_bar(0, 10).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(stat_bar(10, 10).chars().filter(|c| *c == '█').count(), STAT_BAR_WIDTH);
        assert_eq!(stat_bar(5, 10).chars().filter(|c| *c == '█').count(), STAT_BAR_WIDTH / 2);
        // Tiny but non-zero counts still render one cell.
        assert_eq!(stat_bar(1, 1000).chars().filter(|c| *c == '█').count(), 1);
        assert_eq!(stat_bar(3, 10).chars().count(), STAT_BAR_WIDTH);
    }
}
