//! TUI rendering for mapscout using ratatui.

mod input;
mod theme;

pub use input::{Field, InputLine, InputPump, KeyOutcome, SearchForm, handle_event, handle_events};
pub use theme::{Glyphs, Palette, glyphs, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};

use mapscout_engine::{App, EXPORT_FILE_NAME, Findings, NoticeKind, Place, SessionView};
use mapscout_types::{sanitize_single_line, sanitize_terminal_text};

/// Main draw function. Takes `&mut App` to record the results scroll range.
pub fn draw<C>(frame: &mut Frame, app: &mut App<C>, form: &SearchForm) {
    let palette = Palette::standard();
    let glyphs = glyphs(app.ascii_only());
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
            Constraint::Min(1),    // Body
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0], &palette, &glyphs);
    draw_input(frame, app, form, chunks[1], &palette);
    draw_status_bar(frame, app, chunks[2], &palette, &glyphs);
    draw_body(frame, app, chunks[3], &palette, &glyphs);
}

fn draw_header<C>(frame: &mut Frame, app: &App<C>, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let mut spans = vec![
        Span::styled(format!("{} mapscout", glyphs.pin), styles::title(palette)),
        Span::styled(
            "  local business finder",
            Style::default().fg(palette.text_muted),
        ),
    ];
    if let Some(area_hint) = app.area_hint() {
        spans.push(Span::styled(
            format!("  near {}", sanitize_single_line(area_hint)),
            Style::default().fg(palette.text_secondary),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_input<C>(
    frame: &mut Frame,
    app: &App<C>,
    form: &SearchForm,
    area: Rect,
    palette: &Palette,
) {
    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let prompt = if app.ascii_only() { "> " } else { "❯ " };
    let active_border = if app.session().is_loading() {
        palette.border
    } else {
        palette.success
    };

    for (field, line, title, rect) in [
        (Field::Query, form.query(), " Search ", fields[0]),
        (Field::Area, form.area(), " Near ", fields[1]),
    ] {
        let focused = form.focus() == field;
        let border_style = if focused {
            Style::default().fg(active_border)
        } else {
            Style::default().fg(palette.text_muted)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Span::styled(title, Style::default().fg(palette.text_secondary)));

        let text = Line::from(vec![
            Span::styled(prompt, Style::default().fg(palette.primary)),
            Span::styled(line.text(), Style::default().fg(palette.text_primary)),
        ]);
        frame.render_widget(Paragraph::new(text).block(block), rect);

        if focused {
            let before_cursor: String = line.text().chars().take(line.cursor()).collect();
            let offset = Span::raw(prompt).width() + Span::raw(before_cursor).width();
            let max_x = rect.x + rect.width.saturating_sub(2);
            let x = (rect.x + 1).saturating_add(offset as u16).min(max_x);
            frame.set_cursor_position((x, rect.y + 1));
        }
    }
}

fn key_hints(palette: &Palette) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, label) in [
        ("Enter", " search  "),
        ("Tab", " field  "),
        ("PgUp/PgDn", " scroll  "),
        ("^E", " json  "),
        ("^S", " csv  "),
        ("Esc", " quit "),
    ] {
        spans.push(Span::styled(key, styles::key_highlight(palette)));
        spans.push(Span::styled(label, styles::key_hint(palette)));
    }
    Line::from(spans)
}

fn draw_status_bar<C>(
    frame: &mut Frame,
    app: &App<C>,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let session = app.session();
    let (status_text, status_style) = if session.is_loading() {
        let spinner = spinner_frame(app.tick_count(), app.ascii_only());
        (
            format!(
                "{spinner} Searching for \"{}\"...",
                sanitize_single_line(session.query())
            ),
            Style::default().fg(palette.primary),
        )
    } else if let Some(notice) = app.notice() {
        let color = match notice.kind {
            NoticeKind::Info => palette.success,
            NoticeKind::Error => palette.error,
        };
        (
            sanitize_single_line(&notice.text),
            Style::default().fg(color),
        )
    } else if let Some(error) = session.error() {
        (
            format!("{} Error: {}", glyphs.status_error, sanitize_single_line(error)),
            Style::default().fg(palette.error),
        )
    } else {
        match session.view() {
            SessionView::Results { findings, .. } => (
                format!("{} Found {} places", glyphs.status_ready, findings.places.len()),
                Style::default().fg(palette.success),
            ),
            _ => (
                format!("{} Ready", glyphs.status_ready),
                Style::default().fg(palette.text_muted),
            ),
        }
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status_text, status_style),
    ]));
    frame.render_widget(status, area);
}

fn draw_body<C>(
    frame: &mut Frame,
    app: &mut App<C>,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(palette.border))
        .title_top(key_hints(palette).alignment(Alignment::Right))
        .padding(Padding::horizontal(1));

    if matches!(app.session().view(), SessionView::Landing) {
        frame.render_widget(landing(app, palette).block(block), area);
        app.update_scroll_max(0);
        return;
    }

    let lines = body_lines(app, palette, glyphs);

    let inner = block.inner(area);
    let max_scroll = wrapped_line_count(&lines, inner.width).saturating_sub(inner.height);
    app.update_scroll_max(max_scroll);

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((app.scroll_offset(), 0)),
        area,
    );
}

fn body_lines<C>(app: &App<C>, palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let session = app.session();
    let findings = match session.view() {
        SessionView::Landing => None,
        SessionView::Loading { stale, .. } => stale,
        SessionView::Results { findings, .. } => Some(findings),
        // Previous findings stay visible under the error.
        SessionView::Failure { .. } => {
            Some(session.findings()).filter(|findings| !findings.is_empty())
        }
    };

    match findings {
        Some(findings) => findings_lines(findings, palette, glyphs),
        None => vec![Line::from(Span::styled(
            "No results yet.",
            Style::default().fg(palette.text_muted),
        ))],
    }
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut total: u16 = 0;

    for line in lines {
        let line_width = line.width();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(u16::try_from(rows).unwrap_or(u16::MAX));
    }

    total
}

fn landing<C>(app: &App<C>, palette: &Palette) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Find local businesses with map-grounded search.",
            Style::default().fg(palette.text_primary),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Try \"plumbers with weekend hours\" or \"quiet cafes to work from\".",
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(Span::styled(
            format!(
                "Ctrl+E writes the current results to {}.",
                app.export_dir().join(EXPORT_FILE_NAME).display()
            ),
            Style::default().fg(palette.text_muted),
        )),
        Line::from(Span::styled(
            "Ctrl+S saves them as a CSV lead sheet named after the query.",
            Style::default().fg(palette.text_muted),
        )),
    ];
    if app.area_hint().is_none() {
        lines.push(Line::from(Span::styled(
            "Results use your approximate location when it is available.",
            Style::default().fg(palette.text_muted),
        )));
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn findings_lines(
    findings: &Findings,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if findings.places.is_empty() {
        lines.push(Line::from(Span::styled(
            "No places found.",
            Style::default().fg(palette.text_muted),
        )));
    }
    for (index, place) in findings.places.iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        place_lines(&mut lines, place, palette, glyphs);
    }

    let mut paragraphs = findings.paragraphs().peekable();
    if paragraphs.peek().is_some() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Analysis", styles::title(palette))));
        for paragraph in paragraphs {
            lines.push(Line::from(Span::styled(
                sanitize_terminal_text(paragraph).into_owned(),
                Style::default().fg(palette.text_primary),
            )));
            lines.push(Line::from(""));
        }
    }

    lines
}

fn place_lines(lines: &mut Vec<Line<'static>>, place: &Place, palette: &Palette, glyphs: &Glyphs) {
    lines.push(Line::from(vec![
        Span::styled(format!("{} ", glyphs.pin), Style::default().fg(palette.primary)),
        Span::styled(sanitize_single_line(&place.title), styles::place_name(palette)),
    ]));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(sanitize_single_line(&place.uri), styles::link(palette)),
    ]));
    if let Some(summary) = place.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                sanitize_single_line(summary),
                Style::default().fg(palette.text_secondary),
            ),
        ]));
    }
    for review in place.reviews() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", glyphs.bullet),
                Style::default().fg(palette.text_muted),
            ),
            Span::styled(
                format!(
                    "{}{}{}",
                    glyphs.quote_open,
                    sanitize_single_line(review),
                    glyphs.quote_close
                ),
                styles::quote(palette),
            ),
        ]));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use mapscout_engine::{
        AppOptions, SearchCollaborator, SearchError, SearchRequest, SearchResponse,
    };
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};
    use tokio::sync::Notify;

    /// Returns a fixed outcome once `release` is notified.
    struct Scripted {
        outcome: fn() -> Result<SearchResponse, SearchError>,
        release: Arc<Notify>,
    }

    impl SearchCollaborator for Scripted {
        async fn search(&self, _request: SearchRequest) -> Result<SearchResponse, SearchError> {
            self.release.notified().await;
            (self.outcome)()
        }
    }

    fn found() -> Result<SearchResponse, SearchError> {
        Ok(SearchResponse {
            places: vec![
                Place::new("Joe's Plumbing", "https://maps.google.com/?cid=1")
                    .with_summary("Family-run since 1982")
                    .with_review_snippets(vec!["Fixed it fast".into()]),
                Place::new("Pipe Dreams", "https://maps.google.com/?cid=2"),
            ],
            analysis: "Joe's answers weekend calls.\n\nPipe Dreams has no website.".into(),
        })
    }

    fn rate_limited() -> Result<SearchResponse, SearchError> {
        Err(SearchError::Api {
            status: Some(429),
            message: "quota exhausted".into(),
        })
    }

    fn app_with(
        outcome: fn() -> Result<SearchResponse, SearchError>,
        ascii_only: bool,
    ) -> (App<Scripted>, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        let collaborator = Scripted {
            outcome,
            release: release.clone(),
        };
        let options = AppOptions {
            ascii_only,
            ..AppOptions::default()
        };
        (App::new(collaborator, options), release)
    }

    fn render<C>(app: &mut App<C>, form: &SearchForm) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app, form)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn landing_screen_before_any_search() {
        let (mut app, _release) = app_with(found, true);
        let screen = render(&mut app, &SearchForm::default());
        assert!(screen.contains("Find local businesses"));
        assert!(screen.contains("Ready"));
        assert!(!screen.contains("Analysis"));
    }

    #[tokio::test]
    async fn loading_shows_spinner_and_query() {
        let (mut app, _release) = app_with(found, true);
        app.submit_query("plumbers").unwrap();
        let screen = render(&mut app, &SearchForm::default());
        assert!(screen.contains("Searching for \"plumbers\"..."));
        assert!(screen.contains("No results yet."));
    }

    #[tokio::test]
    async fn results_render_places_reviews_and_analysis() {
        let (mut app, release) = app_with(found, true);
        app.submit_query("plumbers").unwrap();
        release.notify_one();
        app.next_completion().await.unwrap();

        let screen = render(&mut app, &SearchForm::default());
        assert!(screen.contains("Found 2 places"));
        assert!(screen.contains("* Joe's Plumbing"));
        assert!(screen.contains("https://maps.google.com/?cid=2"));
        assert!(screen.contains("Family-run since 1982"));
        assert!(screen.contains("- \"Fixed it fast\""));
        assert!(screen.contains("Analysis"));
        assert!(screen.contains("Pipe Dreams has no website."));
    }

    #[tokio::test]
    async fn failure_shows_message() {
        let (mut app, release) = app_with(rate_limited, true);
        app.submit_query("plumbers").unwrap();
        release.notify_one();
        app.next_completion().await.unwrap();

        let screen = render(&mut app, &SearchForm::default());
        assert!(screen.contains("x Error: quota exhausted"));
    }

    #[tokio::test]
    async fn search_form_fields_are_rendered() {
        let (mut app, _release) = app_with(found, true);
        let mut form = SearchForm::new(Some("Austin, TX"));
        form.focused_mut().insert_str("tacos");
        let screen = render(&mut app, &form);
        assert!(screen.contains("> tacos"));
        assert!(screen.contains("> Austin, TX"));
        assert!(screen.contains("Near"));
    }

    fn many_places() -> Result<SearchResponse, SearchError> {
        let places = (1..=10)
            .map(|n| {
                Place::new(format!("Shop {n}"), format!("https://maps.google.com/?cid={n}"))
                    .with_summary(format!("Summary {n}"))
                    .with_review_snippets(vec![format!("Review {n}")])
            })
            .collect();
        Ok(SearchResponse {
            places,
            analysis: "MARKET_ANALYSIS_TEXT".into(),
        })
    }

    #[tokio::test]
    async fn long_results_scroll_to_reveal_analysis() {
        let (mut app, release) = app_with(many_places, true);
        let mut form = SearchForm::default();
        app.submit_query("shops").unwrap();
        release.notify_one();
        app.next_completion().await.unwrap();

        let screen = render(&mut app, &form);
        assert!(screen.contains("* Shop 1"));
        assert!(!screen.contains("MARKET_ANALYSIS_TEXT"));

        let page_down = Event::Key(KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE));
        let down = Event::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        let mut seen = false;
        for ev in [&page_down, &down, &page_down, &page_down] {
            handle_event(&mut app, &mut form, ev);
            seen |= render(&mut app, &form).contains("MARKET_ANALYSIS_TEXT");
        }
        assert!(seen);
        assert!(app.scroll_offset() > 0);

        // A new result set starts back at the top.
        app.submit_query("shops again").unwrap();
        release.notify_one();
        app.next_completion().await.unwrap();
        assert_eq!(app.scroll_offset(), 0);
        assert!(render(&mut app, &form).contains("* Shop 1"));
    }
}
