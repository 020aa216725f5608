//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin view over a
//! [`ChatSession`]:
//! - Event loop (keyboard, resize, exchange events, spinner ticks)
//! - Key handling that edits fields and drives session transitions
//! - Rendering of transcript, input box and status bar
//!
//! Exchanges run in a background task (see [`spawn_exchange`]) and report
//! back over a channel, so the session is only ever touched from this loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use relay_core::{
    spawn_exchange, ChatSession, ChatTransport, SessionEvent, DEFAULT_MODEL, KNOWN_MODELS,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;

use crate::display::{
    input_lines, mask_secret, status_style, status_text, transcript_lines, visible_window,
    StatusInfo, INPUT_HEIGHT,
};

/// Spinner tick rate while a reply streams
const TICK_RATE: Duration = Duration::from_millis(120);

/// Which field keystrokes edit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    /// The message being composed
    #[default]
    Message,
    /// The API key
    ApiKey,
    /// The system message
    System,
}

impl Focus {
    /// Next field in Tab order
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Message => Self::ApiKey,
            Self::ApiKey => Self::System,
            Self::System => Self::Message,
        }
    }

    /// Field label shown in the input box
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Message => "You",
            Self::ApiKey => "API key",
            Self::System => "System",
        }
    }
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// The conversation
    session: ChatSession,
    /// Route to the proxy
    transport: Arc<dyn ChatTransport>,

    // === Exchange Plumbing ===
    /// Sender handed to each spawned exchange
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Events from the in-flight exchange
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// The in-flight exchange task
    exchange: Option<JoinHandle<()>>,

    // === Input State ===
    /// Field receiving keystrokes
    focus: Focus,
    /// API key as typed
    api_key_input: String,
    /// System message as typed
    system_input: String,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered lines (for scroll bounds)
    total_lines: usize,

    // === Misc State ===
    /// Terminal size
    size: (u16, u16),
    /// Spinner frame counter
    spinner_frame: usize,
    /// Transient status notice
    note: Option<String>,
}

impl App {
    /// Create an app around an existing session
    pub fn new(session: ChatSession, transport: Arc<dyn ChatTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let api_key_input = session.api_key().to_string();
        let system_input = session.system_message().unwrap_or_default().to_string();

        Self {
            running: true,
            session,
            transport,
            events_tx,
            events_rx,
            exchange: None,
            focus: Focus::Message,
            api_key_input,
            system_input,
            scroll_offset: 0,
            total_lines: 0,
            size: (80, 24),
            spinner_frame: 0,
            note: None,
        }
    }

    /// The conversation
    #[must_use]
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Whether the event loop should keep going
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Field receiving keystrokes
    #[must_use]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Current transient notice
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut ticks = IntervalStream::new(tokio::time::interval(TICK_RATE));

        let area = terminal.size()?;
        self.size = (area.width, area.height);
        terminal.draw(|frame| self.render(frame))?;

        while self.running {
            tokio::select! {
                maybe_event = event_stream.next() => match maybe_event {
                    // Only handle Press events (not Release or Repeat)
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key);
                    }
                    Some(Ok(Event::Resize(w, h))) => self.size = (w, h),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => self.running = false,
                },
                Some(event) = self.events_rx.recv() => self.handle_session_event(event),
                _ = ticks.next(), if self.session.is_streaming() => {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }

            terminal.draw(|frame| self.render(frame))?;
        }

        if let Some(exchange) = self.exchange.take() {
            exchange.abort();
        }
        Ok(())
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            // Quit
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,

            // Session commands
            KeyCode::Char('l') if ctrl => self.clear_history(),
            KeyCode::F(2) => self.cycle_model(),
            KeyCode::Enter => match self.focus {
                Focus::Message => self.submit(),
                Focus::ApiKey | Focus::System => self.focus = Focus::Message,
            },
            KeyCode::Tab => self.focus = self.focus.next(),

            // Typing
            KeyCode::Char(c) if !ctrl => self.edit_field(|field| field.push(c)),
            KeyCode::Backspace => self.edit_field(|field| {
                field.pop();
            }),

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = self.page_size();
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page).min(max_scroll);
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.page_size());
            }

            _ => {}
        }
    }

    /// Apply an event from the in-flight exchange
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        if self.session.apply(event).is_applied() && !self.session.is_streaming() {
            self.exchange = None;
        }
    }

    /// Submit the message field
    fn submit(&mut self) {
        let Some(request) = self.session.submit_input() else {
            if self.session.is_streaming() {
                self.note = Some("Reply in progress".to_string());
            }
            return;
        };

        self.note = None;
        self.scroll_offset = 0;
        self.exchange = Some(spawn_exchange(
            Arc::clone(&self.transport),
            request,
            self.events_tx.clone(),
        ));
    }

    fn clear_history(&mut self) {
        if self.session.clear() {
            self.scroll_offset = 0;
            self.note = None;
        } else {
            self.note = Some("Wait for the reply to finish before clearing".to_string());
        }
    }

    fn cycle_model(&mut self) {
        let current = self.session.model().unwrap_or(DEFAULT_MODEL);
        let next = KNOWN_MODELS
            .iter()
            .position(|m| *m == current)
            .map_or(0, |idx| (idx + 1) % KNOWN_MODELS.len());
        self.session.set_model(KNOWN_MODELS[next]);
    }

    /// Apply `edit` to the focused field and sync it into the session
    fn edit_field(&mut self, edit: impl FnOnce(&mut String)) {
        match self.focus {
            Focus::Message => edit(self.session.input_mut()),
            Focus::ApiKey => {
                edit(&mut self.api_key_input);
                self.session.set_api_key(self.api_key_input.clone());
            }
            Focus::System => {
                edit(&mut self.system_input);
                let system = if self.system_input.trim().is_empty() {
                    None
                } else {
                    Some(self.system_input.clone())
                };
                self.session.set_system_message(system);
            }
        }
    }

    fn page_size(&self) -> usize {
        usize::from(self.size.1.saturating_sub(INPUT_HEIGHT + 1) / 2).max(1)
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        self.size = (area.width, area.height);

        let [conversation, input, status] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_conversation(frame, conversation);
        self.render_input(frame, input);
        self.render_status(frame, status);
    }

    /// Render conversation area
    fn render_conversation(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let width = usize::from(area.width.saturating_sub(1));
        let height = usize::from(area.height);
        if width < 5 || height == 0 {
            return;
        }

        let lines = transcript_lines(self.session.history(), self.session.is_streaming(), width);
        self.total_lines = lines.len();

        let (start, end, offset) = visible_window(lines.len(), height, self.scroll_offset);
        self.scroll_offset = offset;

        let visible: Vec<Line<'_>> = lines[start..end]
            .iter()
            .map(|line| Line::styled(line.text.clone(), line.style))
            .collect();
        frame.render_widget(Paragraph::new(visible), area);
    }

    /// Render input box
    fn render_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);

        let text = match self.focus {
            Focus::Message => self.session.input().to_string(),
            Focus::ApiKey => mask_secret(&self.api_key_input),
            Focus::System => self.system_input.clone(),
        };
        let (lines, overflow) = input_lines(
            self.focus.label(),
            &text,
            usize::from(inner.width.saturating_sub(1)),
            usize::from(inner.height),
        );

        let block = if overflow {
            block.title(Span::styled("^", Style::default().fg(Color::Yellow)))
        } else {
            block
        };
        let lines: Vec<Line<'_>> = lines
            .into_iter()
            .map(|line| Line::styled(line, Style::default().fg(Color::Green)))
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    /// Render status bar
    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let info = StatusInfo {
            state: self.session.state(),
            model: self.session.model().unwrap_or(DEFAULT_MODEL),
            has_api_key: self.session.has_api_key(),
            spinner_frame: self.spinner_frame,
            scroll_offset: self.scroll_offset,
            note: self.note.as_deref(),
        };
        let status = Paragraph::new(status_text(&info)).style(status_style(info.state));
        frame.render_widget(status, area);
    }
}

/// Terminal type the binary draws to
pub type StdoutTerminal = Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>;
