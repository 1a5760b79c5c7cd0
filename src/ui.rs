// src/ui.rs

use crate::app::{App, AppMode};
use crate::browser::GitSyncModal;
use crate::types::{GitStatus, Opus, OpusTypeConfig};
use chrono::{DateTime, Utc};
use tui::{
    Frame,
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(main_chunks[2]);

    draw_type_tabs(f, app, main_chunks[0]);
    draw_search_bar(f, app, main_chunks[1]);
    draw_opus_list(f, app, body_chunks[0]);
    draw_detail_panel(f, app, body_chunks[1]);
    draw_help(f, app, main_chunks[3]);

    if app.mode == AppMode::Sync && app.modal.is_open() {
        draw_sync_popup(f, &app.modal);
    }
}

fn draw_type_tabs<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let configs = app.view.type_configs();
    let mut titles = vec![Spans::from("All")];
    titles.extend(configs.iter().map(|config| {
        Spans::from(vec![
            Span::raw(format!("{} ", config.icon.glyph())),
            Span::styled(config.label.clone(), Style::default().fg(palette(&config.text_color))),
        ])
    }));

    let selected = app
        .view
        .type_filter()
        .and_then(|key| configs.iter().position(|c| c.key == key))
        .map_or(0, |i| i + 1);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Type"))
        .select(selected)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    f.render_widget(tabs, area);
}

fn draw_search_bar<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let is_active = app.mode == AppMode::Search;
    let border_style = if is_active {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text = if app.search_input.value().is_empty() && !is_active {
        Span::styled("Search opuses...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.search_input.value().to_string())
    };
    let search = Paragraph::new(Spans::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search")
            .border_style(border_style),
    );
    f.render_widget(search, area);

    if is_active {
        let scroll = app.search_input.visual_scroll(area.width.saturating_sub(2) as usize);
        let cursor = app.search_input.visual_cursor().saturating_sub(scroll);
        f.set_cursor(area.x + 1 + cursor as u16, area.y + 1);
    }
}

fn draw_opus_list<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Opuses");

    if app.view.is_loading() && app.view.visible().is_empty() {
        let loading = Paragraph::new("Loading opuses...")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(loading, area);
        return;
    }

    if let Some(empty) = app.view.empty_state() {
        let text = Text::from(vec![
            Spans::from(Span::styled(
                empty.title(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Spans::from(Span::styled(empty.hint(), Style::default().fg(Color::DarkGray))),
        ]);
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .view
        .visible()
        .iter()
        .map(|entry| opus_list_item(entry.opus, entry.type_config))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    app.list_state.select(app.view.selected_visible_index());
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn opus_list_item(opus: &Opus, config: &OpusTypeConfig) -> ListItem<'static> {
    let mut header = vec![
        Span::raw(format!("{} ", config.icon.glyph())),
        Span::raw(opus.name.clone()),
    ];
    header.extend(badges(opus));

    ListItem::new(vec![
        Spans::from(header),
        Spans::from(vec![
            Span::styled(
                format!("   {}", config.label),
                Style::default().fg(palette(&config.text_color)),
            ),
            Span::styled(
                format!(
                    "  {}  {} items",
                    format_date(&opus.created_at),
                    opus.count.items
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ])
}

fn badges(opus: &Opus) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if opus.is_strategic {
        spans.push(Span::styled(" ★ Strategic", Style::default().fg(Color::Yellow)));
    }
    if opus.is_dynamic {
        spans.push(Span::styled(" ↻ Dynamic", Style::default().fg(Color::Cyan)));
    }
    spans
}

fn draw_detail_panel<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Details");

    let (Some(opus), Some(config)) = (app.view.selected(), app.view.selected_type_config()) else {
        let placeholder = Paragraph::new("Select an opus to see its details.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(placeholder, area);
        return;
    };

    let muted = Style::default().fg(Color::DarkGray);
    let mut header = vec![Span::styled(
        format!("{} {}", config.icon.glyph(), config.label),
        Style::default()
            .fg(palette(&config.text_color))
            .add_modifier(Modifier::BOLD),
    )];
    header.extend(badges(opus));

    let mut lines = vec![
        Spans::from(header),
        Spans::from(Span::styled(
            opus.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::styled(
            format!("Created {}", format_date(&opus.created_at)),
            muted,
        )),
    ];
    if opus.updated_at != opus.created_at {
        lines.push(Spans::from(Span::styled(
            format!("Updated {}", format_date(&opus.updated_at)),
            muted,
        )));
    }
    lines.push(Spans::from(Span::styled(
        format!("{} items", opus.count.items),
        muted,
    )));
    if let Some(hash) = &opus.last_commit_hash {
        let pushed = opus
            .last_push_at
            .map(|at| format!(", pushed {}", format_date(&at)))
            .unwrap_or_default();
        lines.push(Spans::from(Span::styled(
            format!("Last commit {}{}", short_hash(hash), pushed),
            Style::default().fg(Color::Yellow),
        )));
    }

    if !opus.raison_detre.is_empty() {
        lines.push(Spans::default());
        lines.push(Spans::from(Span::styled(
            "Raison d'être",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(opus.raison_detre.lines().map(|l| Spans::from(l.to_string())));
    }

    lines.push(Spans::default());
    if opus.content.is_empty() {
        lines.push(Spans::from(Span::styled("No content", muted)));
    } else {
        lines.extend(opus.content.lines().map(|l| Spans::from(l.to_string())));
    }

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(detail, area);
}

fn draw_help<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let help_text = match app.mode {
        AppMode::Normal => {
            "↓↑: Navigate | ←→/<Tab>: Type | /: Search | g: Git sync | r: Reload | q: Quit"
        }
        AppMode::Search => "Type to filter | ↓↑: Navigate | <Enter>: Done | <Esc>: Clear",
        AppMode::Sync => "<Enter>: Commit | <Tab>: Toggle push | <Esc>: Skip",
    };
    let mut spans = vec![Span::raw(help_text)];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!("  [{notice}]"),
            Style::default().fg(Color::Green),
        ));
    }
    let help = Paragraph::new(Spans::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_sync_popup<B: Backend>(f: &mut Frame<B>, modal: &GitSyncModal) {
    let area = centered_rect(70, 22.min(f.size().height), f.size());
    let title = modal
        .target()
        .map(|t| format!("Sync to Git: {}", t.item_title))
        .unwrap_or_default();
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(5),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(inner);

    let status = Paragraph::new(status_lines(modal.status()))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::BOTTOM).title("Repository status"));
    f.render_widget(status, chunks[0]);

    let message_style = if modal.is_loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let message = Paragraph::new(modal.commit_message())
        .style(message_style)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Commit message"));
    f.render_widget(message, chunks[1]);

    let checkbox = if modal.should_push() { "[x]" } else { "[ ]" };
    f.render_widget(
        Paragraph::new(format!("{checkbox} Push to remote after commit")),
        chunks[2],
    );

    if let Some(text) = modal.result_message() {
        let color = if modal.result().is_some_and(|r| r.success) {
            Color::Green
        } else {
            Color::Red
        };
        let result = Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true });
        f.render_widget(result, chunks[3]);
    }

    let submit_style = if modal.can_submit() || modal.is_loading() {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let actions = Paragraph::new(Spans::from(vec![
        Span::styled(format!("<Enter> {}", modal.submit_label()), submit_style),
        Span::raw("   <Esc> Skip"),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(actions, chunks[4]);
}

fn status_lines(status: Option<&GitStatus>) -> Vec<Spans<'static>> {
    let Some(status) = status else {
        return vec![Spans::from(Span::styled(
            "Checking repository...",
            Style::default().fg(Color::DarkGray),
        ))];
    };
    if !status.success {
        let error = status.error.clone().unwrap_or_else(|| "Unknown error".to_string());
        return vec![Spans::from(Span::styled(error, Style::default().fg(Color::Red)))];
    }

    let mut lines = vec![Spans::from(vec![
        Span::raw("Branch: "),
        Span::styled(
            status.branch.clone().unwrap_or_default(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(
            "  ↑{} ↓{}",
            status.ahead.unwrap_or(0),
            status.behind.unwrap_or(0)
        )),
    ])];

    if status.is_clean() {
        lines.push(Spans::from(Span::styled(
            "Working tree clean",
            Style::default().fg(Color::Green),
        )));
        return lines;
    }

    let count = |list: &Option<Vec<String>>| list.as_ref().map_or(0, Vec::len);
    lines.push(Spans::from(vec![
        Span::styled(
            format!("{} staged  ", count(&status.staged)),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!("{} modified  ", count(&status.modified)),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("{} new  ", count(&status.created)),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!("{} deleted  ", count(&status.deleted)),
            Style::default().fg(Color::Red),
        ),
        Span::styled(
            format!("{} untracked", count(&status.not_added)),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    let conflicted = count(&status.conflicted);
    if conflicted > 0 {
        lines.push(Spans::from(Span::styled(
            format!("{conflicted} conflicted"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines
}

/// Map a palette token such as `text-sky-700` onto the nearest terminal color.
fn palette(token: &str) -> Color {
    let hue = token.split('-').nth(1).unwrap_or_default();
    match hue {
        "red" | "rose" => Color::Red,
        "orange" | "amber" | "yellow" => Color::Yellow,
        "lime" | "green" | "emerald" => Color::Green,
        "teal" | "cyan" | "sky" => Color::Cyan,
        "blue" | "indigo" => Color::Blue,
        "violet" | "purple" | "fuchsia" | "pink" => Color::Magenta,
        _ => Color::Gray,
    }
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
