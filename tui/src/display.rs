//! Display Helpers
//!
//! Pure functions that turn session state into the lines the terminal draws.
//! Nothing here touches the terminal, so layout rules are testable on their
//! own.

use ratatui::style::{Color, Modifier, Style};
use relay_core::session::ERROR_PREFIX;
use relay_core::{ChatMessage, MessageRole, SessionState};

/// Input box height (lines), including its separator
pub const INPUT_HEIGHT: u16 = 5;

/// Assistant accent color
pub const ASSISTANT_COLOR: Color = Color::Rgb(255, 105, 180);

/// Spinner frames shown while a reply streams
const SPINNER: &[&str] = &["|", "/", "-", "\\"];

/// One wrapped transcript line and how to style it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptLine {
    /// Text to draw
    pub text: String,
    /// Style to draw it with
    pub style: Style,
}

impl TranscriptLine {
    fn blank() -> Self {
        Self {
            text: String::new(),
            style: Style::default(),
        }
    }
}

/// Style for a history entry
#[must_use]
pub fn message_style(message: &ChatMessage) -> Style {
    match message.role {
        MessageRole::User => Style::default().fg(Color::Green),
        MessageRole::Assistant if message.content.starts_with(ERROR_PREFIX) => {
            Style::default().fg(Color::Red)
        }
        MessageRole::Assistant => Style::default().fg(ASSISTANT_COLOR),
    }
}

/// Wrap the whole history to `width` columns
///
/// Each entry is prefixed with its role label and followed by a blank line.
/// While `streaming`, the trailing assistant entry gets a cursor.
#[must_use]
pub fn transcript_lines(
    history: &[ChatMessage],
    streaming: bool,
    width: usize,
) -> Vec<TranscriptLine> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for (idx, message) in history.iter().enumerate() {
        let is_live = streaming && idx + 1 == history.len() && message.is_assistant();
        let cursor = if is_live { "_" } else { "" };
        let content = format!("{}: {}{}", message.role.label(), message.content, cursor);
        let style = message_style(message);

        for line in textwrap::wrap(&content, width) {
            lines.push(TranscriptLine {
                text: line.into_owned(),
                style,
            });
        }
        lines.push(TranscriptLine::blank());
    }

    lines
}

/// Lines visible in a viewport of `height` rows
///
/// `scroll_offset` counts lines from the bottom (0 = latest). Returns the
/// visible range and the offset clamped to what the content allows.
#[must_use]
pub fn visible_window(total: usize, height: usize, scroll_offset: usize) -> (usize, usize, usize) {
    let max_scroll = total.saturating_sub(height);
    let offset = scroll_offset.min(max_scroll);
    let end = total - offset;
    let start = end.saturating_sub(height);
    (start, end, offset)
}

/// Wrap an input field, keeping the last `height` lines
///
/// Returns the lines and whether earlier lines were cut off.
#[must_use]
pub fn input_lines(label: &str, text: &str, width: usize, height: usize) -> (Vec<String>, bool) {
    let full = format!("{label}: {text}_");
    let wrapped: Vec<String> = textwrap::wrap(&full, width.max(1))
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect();

    if wrapped.len() > height {
        let skip = wrapped.len() - height;
        (wrapped.into_iter().skip(skip).collect(), true)
    } else {
        (wrapped, false)
    }
}

/// Mask a secret for display
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

/// Everything the status bar reports
#[derive(Clone, Debug)]
pub struct StatusInfo<'a> {
    /// Session lifecycle state
    pub state: SessionState,
    /// Model the next request uses
    pub model: &'a str,
    /// Whether an API key is set
    pub has_api_key: bool,
    /// Spinner frame counter
    pub spinner_frame: usize,
    /// Lines scrolled up from the bottom
    pub scroll_offset: usize,
    /// Transient notice, shown first
    pub note: Option<&'a str>,
}

/// Render the status bar text
#[must_use]
pub fn status_text(info: &StatusInfo<'_>) -> String {
    let mut parts = Vec::new();

    if let Some(note) = info.note {
        parts.push(note.to_string());
    }

    let state = match info.state {
        SessionState::Idle => info.state.description().to_string(),
        SessionState::Streaming => format!(
            "{} {}",
            info.state.description(),
            SPINNER[info.spinner_frame % SPINNER.len()]
        ),
    };
    parts.push(state);
    parts.push(info.model.to_string());

    if !info.has_api_key {
        parts.push("no API key".to_string());
    }
    if info.scroll_offset > 0 {
        parts.push(format!("^{} lines", info.scroll_offset));
    }
    parts.push("Tab field | F2 model | Ctrl-L clear | Esc quit".to_string());

    format!(" {}", parts.join(" | "))
}

/// Style for the status bar
#[must_use]
pub fn status_style(state: SessionState) -> Style {
    match state {
        SessionState::Idle => Style::default().fg(Color::DarkGray),
        SessionState::Streaming => Style::default()
            .fg(ASSISTANT_COLOR)
            .add_modifier(Modifier::BOLD),
    }
}
