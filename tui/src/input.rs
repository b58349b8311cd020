//! Input handling for the mapscout TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

use mapscout_engine::{App, SearchCollaborator};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024;
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and hands them to the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Unblock the input thread if it is waiting on channel capacity.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Single-line text editor. The cursor is a char index into `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Insert pasted text. Line breaks and tabs become spaces; other control
    /// characters are dropped.
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            match c {
                '\r' | '\n' | '\t' => self.insert_char(' '),
                c if c.is_control() => {}
                c => self.insert_char(c),
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Which field of the search form receives typed text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Query,
    Area,
}

/// Query and area fields. Tab moves focus between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    query: InputLine,
    area: InputLine,
    focus: Field,
}

impl SearchForm {
    /// Empty query; the area field starts with the configured hint.
    #[must_use]
    pub fn new(area_hint: Option<&str>) -> Self {
        let mut area = InputLine::new();
        if let Some(hint) = area_hint {
            area.insert_str(hint);
        }
        Self {
            query: InputLine::new(),
            area,
            focus: Field::Query,
        }
    }

    #[must_use]
    pub fn query(&self) -> &InputLine {
        &self.query
    }

    #[must_use]
    pub fn area(&self) -> &InputLine {
        &self.area
    }

    #[must_use]
    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Query => Field::Area,
            Field::Area => Field::Query,
        };
    }

    pub fn focused_mut(&mut self) -> &mut InputLine {
        match self.focus {
            Field::Query => &mut self.query,
            Field::Area => &mut self.area,
        }
    }

    fn area_hint(&self) -> Option<String> {
        Some(self.area.text().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// What a key press asks of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Apply one terminal event to the app and the search form.
pub fn handle_event<C>(app: &mut App<C>, form: &mut SearchForm, ev: &Event) -> KeyOutcome
where
    C: SearchCollaborator + 'static,
{
    match ev {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, form, *key),
        Event::Paste(text) => {
            form.focused_mut().insert_str(text);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

fn handle_key<C>(app: &mut App<C>, form: &mut SearchForm, key: KeyEvent) -> KeyOutcome
where
    C: SearchCollaborator + 'static,
{
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Char('c') if ctrl => return KeyOutcome::Quit,
        KeyCode::Char('e') if ctrl => {
            if let Err(e) = app.export() {
                tracing::warn!("Export failed: {e}");
            }
        }
        KeyCode::Char('s') if ctrl => {
            if let Err(e) = app.export_csv() {
                tracing::warn!("CSV export failed: {e}");
            }
        }
        KeyCode::Char('u') if ctrl => form.focused_mut().clear(),
        KeyCode::Char('a') if ctrl => form.focused_mut().home(),
        KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
        KeyCode::Enter => {
            app.set_area_hint(form.area_hint());
            // Text stays in the box so the query can be refined.
            if let Some(id) = app.submit_query(form.query().text()) {
                tracing::debug!(request = %id, "Query submitted");
            }
        }
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::PageDown => app.scroll_page_down(),
        KeyCode::Char(c) if !ctrl => form.focused_mut().insert_char(c),
        KeyCode::Backspace => form.focused_mut().backspace(),
        KeyCode::Delete => form.focused_mut().delete(),
        KeyCode::Left => form.focused_mut().move_left(),
        KeyCode::Right => form.focused_mut().move_right(),
        KeyCode::Home => form.focused_mut().home(),
        KeyCode::End => form.focused_mut().end(),
        _ => {}
    }
    KeyOutcome::Continue
}

/// Drain pending terminal events. Returns `true` when the user asked to quit.
pub fn handle_events<C>(app: &mut App<C>, form: &mut SearchForm, input: &mut InputPump) -> Result<bool>
where
    C: SearchCollaborator + 'static,
{
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };
        processed += 1;

        if handle_event(app, form, &ev) == KeyOutcome::Quit {
            return Ok(true);
        }
    }
    Ok(false)
}
