//! UI rendering for the terminal user interface, built on `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Tabs, Wrap},
};

use crate::app::{App, CatalogStatus, Tab};
use crate::catalog::Book;
use crate::config::{ControlsSettings, UiSettings};
use crate::session::{Phase, SessionState};

const CONTROLS: [(&str, &str); 12] = [
    ("1-4", "book"),
    ("tab", "lessons/queue"),
    ("j/k", "up/down"),
    ("enter", "play selected"),
    ("space/p", "play/pause"),
    ("h/l", "prev/next"),
    // H/L is filled in from config.
    ("H/L", ""),
    ("[/]/=", "speed -/+/reset"),
    ("/", "search"),
    ("x", "dismiss error"),
    ("r", "reload"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_seconds: u64) -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| {
            if *k == "H/L" {
                format!("[H/L] seek -/+{seek_seconds}s")
            } else {
                format!("[{k}] {v}")
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format seconds as `MM:SS`; `--:--` while unknown.
fn format_mmss(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let secs = seconds as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Stopped",
        Phase::Loading => "Loading",
        Phase::Playing => "Playing",
        Phase::Paused => "Paused",
        Phase::Ended => "Finished",
        Phase::Errored => "Error",
    }
}

/// Compute the `[start, end)` window of a list of `total` rows that keeps
/// `selected` roughly centered in `height` rows.
fn visible_window(total: usize, selected: usize, height: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn bordered(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

/// Render the entire UI into `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    player: &SessionState,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" nceplay ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_book_tabs(frame, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    match app.tab {
        Tab::Lessons => draw_lessons(frame, app, player, body[0]),
        Tab::Queue => draw_queue(frame, app, player, body[0]),
    }
    draw_lyrics(frame, app, player, body[1]);

    draw_player_bar(frame, player, chunks[3]);

    let footer = Paragraph::new(controls_text(controls_settings.seek_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

fn draw_book_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Book::ALL
        .iter()
        .map(|b| Line::from(format!(" {} {} ", b.number(), b)))
        .collect();
    let selected = Book::ALL.iter().position(|b| *b == app.book).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(bordered(" books "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_widget(tabs, area);
}

fn draw_lessons(frame: &mut Frame, app: &App, player: &SessionState, area: Rect) {
    let q = app.filter_query.trim();
    let title = if app.filter_mode || !q.is_empty() {
        format!(" lessons · /{q} ")
    } else {
        format!(" lessons · {} ", app.book)
    };

    let message = match &app.catalog_status {
        CatalogStatus::Loading => Some("Loading lessons…".to_string()),
        CatalogStatus::Failed(e) => Some(format!("{e}\n\nPress r to retry.")),
        CatalogStatus::Loaded if app.lessons.is_empty() => {
            Some("This book has no lessons.".to_string())
        }
        CatalogStatus::Loaded => None,
    };
    if let Some(message) = message {
        let p = Paragraph::new(message)
            .block(bordered(&title))
            .wrap(Wrap { trim: true });
        frame.render_widget(p, area);
        return;
    }

    let display = app.visible_lessons();
    let playing_id = player.current_track().map(|t| t.id.as_str());
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end) = visible_window(display.len(), sel_pos, area.height.saturating_sub(2) as usize);

    let items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let track = &app.lessons[i];
            let marker = if Some(track.id.as_str()) == playing_id { "♪ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(track.lesson_label.clone(), Style::default().bold()),
                Span::raw(" "),
                Span::raw(track.title.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(bordered(&title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !display.is_empty() {
        state.select(Some(sel_pos - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_queue(frame: &mut Frame, app: &App, player: &SessionState, area: Rect) {
    if player.queue.is_empty() {
        let p = Paragraph::new("Nothing queued. Pick a lesson with enter.")
            .block(bordered(" queue "))
            .wrap(Wrap { trim: true });
        frame.render_widget(p, area);
        return;
    }

    let cursor = app.queue_cursor.min(player.queue.len() - 1);
    let (start, end) = visible_window(player.queue.len(), cursor, area.height.saturating_sub(2) as usize);
    let items: Vec<ListItem> = player.queue[start..end]
        .iter()
        .enumerate()
        .map(|(offset, track)| {
            let marker = if player.current_index == Some(start + offset) { "♪ " } else { "  " };
            ListItem::new(format!("{marker}{}", track.display()))
        })
        .collect();

    let list = List::new(items)
        .block(bordered(" queue "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(cursor - start));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_lyrics(frame: &mut Frame, app: &App, player: &SessionState, area: Rect) {
    let block = bordered(" lyrics ");
    let lyrics = &app.lyrics;

    let placeholder = if player.current_track().is_none() {
        Some("Select a lesson to see its lyrics.")
    } else if lyrics.missing() {
        Some("No lyrics for this lesson.")
    } else if lyrics.is_loading() {
        Some("Loading lyrics…")
    } else {
        None
    };
    if let Some(text) = placeholder {
        let p = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block)
            .dim();
        frame.render_widget(p, area);
        return;
    }

    let rows = area.height.saturating_sub(2) as usize;
    let offset = lyrics.scroll_offset(rows);
    let active = lyrics.active();
    let lines: Vec<Line> = lyrics
        .lines()
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, l)| {
            if Some(i) == active {
                Line::styled(
                    l.text.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                Line::raw(l.text.clone()).dim()
            }
        })
        .collect();

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    frame.render_widget(p, area);
}

fn draw_player_bar(frame: &mut Frame, player: &SessionState, area: Rect) {
    let block = bordered(" player ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let title = match player.current_track() {
        Some(t) => format!("{} · {}", t.display(), t.book),
        None => "Nothing playing".to_string(),
    };
    let total = if player.duration > 0.0 { player.duration } else { f64::NAN };
    let position = match player.current_index {
        Some(i) => format!(
            "{}{}/{}{}",
            if player.has_prev() { "◀ " } else { "  " },
            i + 1,
            player.queue.len(),
            if player.has_next() { " ▶" } else { "  " },
        ),
        None => String::new(),
    };
    let status = format!(
        "{} · {} / {} · {:.2}x {}",
        phase_label(player.phase),
        format_mmss(player.current_time),
        format_mmss(total),
        player.playback_rate,
        position,
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(title, Style::default().bold()),
            Span::raw("  "),
            Span::raw(status),
        ])),
        rows[0],
    );

    let gauge = Gauge::default()
        .ratio(player.progress())
        .label("")
        .gauge_style(Style::default().fg(Color::Cyan));
    frame.render_widget(gauge, rows[1]);

    if let Some(err) = &player.last_error {
        frame.render_widget(
            Paragraph::new(format!("⚠ {err}  (x to dismiss)")).fg(Color::Red),
            rows[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn format_mmss_handles_unknown() {
        assert_eq!(format_mmss(0.0), "00:00");
        assert_eq!(format_mmss(125.9), "02:05");
        assert_eq!(format_mmss(f64::NAN), "--:--");
    }

    #[test]
    fn controls_text_includes_seek_step() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] seek -/+7s"));
        assert!(text.contains("[q] quit"));
    }

    #[test]
    fn visible_window_centers_selection() {
        assert_eq!(visible_window(5, 3, 10), (0, 5));
        assert_eq!(visible_window(100, 50, 10), (45, 55));
        assert_eq!(visible_window(100, 2, 10), (0, 10));
        assert_eq!(visible_window(100, 99, 10), (90, 100));
    }

    #[test]
    fn draw_renders_books_and_empty_player() {
        let (app, _) = App::new(Book::Two);
        let player = SessionState::default();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    &app,
                    &player,
                    &UiSettings::default(),
                    &ControlsSettings::default(),
                )
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("NCE1"));
        assert!(text.contains("NCE4"));
        assert!(text.contains("Nothing playing"));
        assert!(text.contains("Select a lesson"));
    }
}
