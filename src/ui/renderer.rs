use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::core::constants::{
    APP_TITLE, INPUT_MAX_ROWS, LOADING_TEXT, SIDEBAR_WIDTH, SUGGESTED_QUESTIONS,
};
use crate::core::health::HealthStatus;
use crate::core::message::{ChatMessage, MessageKind};
use crate::core::navigation::{is_narrow, Section};
use crate::core::session::Session;
use crate::ui::html::{format_page, format_similarity, source_preview};
use crate::ui::markdown::render_markdown;
use crate::ui::theme::Theme;
use crate::ui::wrap::{wrap_spans, wrap_text};
use crate::utils::line_editor::{display_text, LineEditorOptions};
use crate::utils::text::html_to_text;

const SPINNER_FRAMES: [&str; 4] = ["○", "◔", "◑", "◕"];
const CONTENT_INDENT: &str = "  ";

/// Presentation-only state the event loop keeps between frames.
#[derive(Debug)]
pub struct ViewState {
    pub server_url: String,
    /// Lines scrolled up from the bottom of the transcript; 0 follows new
    /// messages.
    pub scroll_from_bottom: u16,
    /// Last rendered sidebar area, used to route mouse clicks.
    pub sidebar_area: Option<Rect>,
    pub started: Instant,
}

impl ViewState {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            scroll_from_bottom: 0,
            sidebar_area: None,
            started: Instant::now(),
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn follow_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    fn spinner(&self, now: Instant) -> &'static str {
        let frame = (now.duration_since(self.started).as_millis() / 150) as usize;
        SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
    }
}

pub fn ui(f: &mut Frame, session: &Session, view: &mut ViewState, theme: &Theme) {
    let now = Instant::now();
    let area = f.area();
    let narrow = is_narrow(area.width);

    let (sidebar_area, main_area) = if narrow {
        (
            session
                .layout
                .sidebar_open
                .then(|| Rect { width: SIDEBAR_WIDTH.min(area.width), ..area }),
            area,
        )
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);
        (Some(columns[0]), columns[1])
    };

    match session.layout.active_section {
        Section::Chat => draw_chat(f, session, view, theme, main_area, narrow, now),
        Section::About => draw_about(f, view, theme, main_area, narrow),
    }

    view.sidebar_area = sidebar_area;
    if let Some(sidebar) = sidebar_area {
        if narrow {
            f.render_widget(Clear, sidebar);
        }
        draw_sidebar(f, session, theme, sidebar, now);
    }

    if session.layout.settings_open {
        draw_settings(f, session, theme, area, now);
    }
}

fn header_line(theme: &Theme, narrow: bool, subtitle: &str) -> Line<'static> {
    let mut spans = vec![Span::styled(format!("🩺 {APP_TITLE}"), theme.title_style)];
    if !subtitle.is_empty() {
        spans.push(Span::styled(format!("  {subtitle}"), theme.hint_style));
    }
    if narrow {
        spans.push(Span::styled("  (Ctrl+B menu)", theme.hint_style));
    }
    Line::from(spans)
}

fn draw_chat(
    f: &mut Frame,
    session: &Session,
    view: &mut ViewState,
    theme: &Theme,
    area: Rect,
    narrow: bool,
    now: Instant,
) {
    let input_inner_width = area.width.saturating_sub(2);
    let input_rows = session.input.visual_rows(input_inner_width, INPUT_MAX_ROWS);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(input_rows + 2),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(header_line(theme, narrow, "Medical Q&A")),
        chunks[0],
    );

    let body = chunks[1];
    let lines = if session.welcome_visible() && session.transcript().is_empty() {
        build_welcome_lines(theme, body.width as usize)
    } else {
        build_transcript_lines(session, theme, body.width as usize, view.spinner(now))
    };

    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_offset = total.saturating_sub(body.height);
    view.scroll_from_bottom = view.scroll_from_bottom.min(max_offset);
    let top = max_offset - view.scroll_from_bottom;
    f.render_widget(Paragraph::new(lines).scroll((top, 0)), body);

    draw_input(f, session, theme, chunks[2], input_rows);
}

fn draw_input(f: &mut Frame, session: &Session, theme: &Theme, area: Rect, rows: u16) {
    let inner_width = area.width.saturating_sub(2);
    let (cursor_col, cursor_row) = session.input.cursor_position(inner_width);
    let scroll = cursor_row.saturating_sub(rows.saturating_sub(1));

    let (title, border_style) = if session.submit_enabled() {
        (
            " Ask a medical question · Enter send · Shift+Enter newline ",
            theme.input_border_style,
        )
    } else {
        (" Waiting for the answer... ", theme.input_disabled_border_style)
    };

    let wrapped: Vec<Line> = char_wrap(&session.input.text, inner_width)
        .into_iter()
        .map(Line::from)
        .collect();
    let input = Paragraph::new(wrapped)
        .style(theme.input_text_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .scroll((scroll, 0));
    f.render_widget(input, area);

    if session.input_focused() && !session.layout.settings_open {
        f.set_cursor_position((
            area.x + 1 + cursor_col.min(inner_width.saturating_sub(1)),
            area.y + 1 + cursor_row - scroll,
        ));
    }
}

/// Hard-wrap by display width, matching
/// [`LineEditorState::cursor_position`](crate::utils::line_editor::LineEditorState::cursor_position).
pub fn char_wrap(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let mut row = String::new();
        let mut column = 0;
        for c in line.chars() {
            let char_width = c.width().unwrap_or(0);
            if column + char_width > width {
                rows.push(std::mem::take(&mut row));
                column = 0;
            }
            row.push(c);
            column += char_width;
        }
        rows.push(row);
    }
    rows
}

pub fn build_welcome_lines(theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            format!("{CONTENT_INDENT}Welcome to {APP_TITLE}"),
            theme.heading_style,
        )),
        Line::default(),
    ];
    lines.extend(wrap_text(
        "Ask questions about blood disorders and hematology. Answers are generated from a curated medical knowledge base, and every answer lists the passages it was drawn from.",
        theme.assistant_text_style,
        width,
        CONTENT_INDENT,
    ));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("{CONTENT_INDENT}Try one of these:"),
        theme.hint_style,
    )));
    for (index, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        lines.extend(wrap_spans(
            &[Span::styled(question.to_string(), theme.user_text_style)],
            width,
            Span::styled(
                format!("{CONTENT_INDENT}Alt+{}  ", index + 1),
                theme.list_marker_style,
            ),
            Span::raw(format!("{CONTENT_INDENT}       ")),
        ));
    }
    lines.push(Line::default());
    lines.extend(wrap_text(
        "Answers are informational and are not a substitute for professional medical advice.",
        theme.hint_style,
        width,
        CONTENT_INDENT,
    ));
    lines
}

/// Transcript as wrapped terminal lines, oldest first.
pub fn build_transcript_lines(
    session: &Session,
    theme: &Theme,
    width: usize,
    spinner: &str,
) -> Vec<Line<'static>> {
    let transcript = session.transcript();
    let focused = session.focused_sources();
    let content_width = width.saturating_sub(CONTENT_INDENT.len()).max(1);

    let mut lines = Vec::new();
    for message in transcript.messages() {
        lines.push(Line::default());
        lines.extend(message_lines(
            message,
            theme,
            content_width,
            spinner,
            transcript.sources_expanded(&message.id),
            focused.as_ref() == Some(&message.id),
        ));
    }
    lines
}

fn indent(lines: Vec<Line<'static>>) -> impl Iterator<Item = Line<'static>> {
    lines.into_iter().map(|mut line| {
        line.spans.insert(0, Span::raw(CONTENT_INDENT));
        line
    })
}

fn message_lines(
    message: &ChatMessage,
    theme: &Theme,
    width: usize,
    spinner: &str,
    expanded: bool,
    focused: bool,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if message.is_user() {
        lines.push(Line::from(Span::styled("You", theme.user_prefix_style)));
        lines.extend(indent(wrap_text(
            &message.content,
            theme.user_text_style,
            width,
            "",
        )));
        return lines;
    }

    lines.push(Line::from(Span::styled(
        format!("🩺 {APP_TITLE}"),
        theme.assistant_prefix_style,
    )));
    match message.kind {
        MessageKind::Loading => {
            lines.extend(indent(wrap_spans(
                &[Span::styled(LOADING_TEXT, theme.loading_style)],
                width,
                Span::styled(format!("{spinner} "), theme.loading_style),
                Span::raw("  "),
            )));
        }
        MessageKind::Notice => {
            lines.extend(indent(wrap_spans(
                &[Span::styled(message.content.clone(), theme.notice_style)],
                width,
                Span::styled("❌ ", theme.notice_style),
                Span::raw("   "),
            )));
        }
        MessageKind::Text => {
            let markdown = match message.plain.as_deref() {
                Some(plain) if !plain.trim().is_empty() => plain.to_string(),
                _ => html_to_text(&message.content),
            };
            lines.extend(indent(render_markdown(&markdown, theme, width)));
        }
    }

    if message.has_sources() {
        lines.extend(indent(source_lines(message, theme, width, expanded, focused)));
    }
    lines
}

fn source_lines(
    message: &ChatMessage,
    theme: &Theme,
    width: usize,
    expanded: bool,
    focused: bool,
) -> Vec<Line<'static>> {
    let arrow = if expanded { "▾" } else { "▸" };
    let toggle_style = if focused {
        theme.sources_focus_style
    } else {
        theme.sources_toggle_style
    };
    let mut toggle = vec![Span::styled(
        format!(
            "{arrow} 📚 {} Sources Retrieved",
            message.sources.len()
        ),
        toggle_style,
    )];
    if focused {
        toggle.push(Span::styled("  (Ctrl+O)", theme.hint_style));
    }

    let mut lines = vec![Line::default(), Line::from(toggle)];
    if !expanded {
        return lines;
    }

    for source in &message.sources {
        lines.extend(wrap_spans(
            &[
                Span::styled(
                    format!("📄 {} · {}", source.file, format_page(source.page)),
                    theme.source_meta_style,
                ),
                Span::styled(
                    format!("  {}", format_similarity(source.similarity)),
                    theme.source_similarity_style,
                ),
            ],
            width,
            Span::raw("  "),
            Span::raw("    "),
        ));
        lines.extend(wrap_text(
            &source_preview(&source.text).replace('\n', " "),
            theme.source_text_style,
            width,
            "    ",
        ));
    }
    lines
}

fn status_span(label: &str, ok: bool, status: &HealthStatus, theme: &Theme) -> Line<'static> {
    let style = if !status.checked {
        theme.status_pending_style
    } else if ok {
        theme.status_ok_style
    } else {
        theme.status_bad_style
    };
    let state = if !status.checked {
        "checking"
    } else if ok {
        "connected"
    } else {
        "disconnected"
    };
    Line::from(vec![
        Span::styled(" ● ", style),
        Span::styled(format!("{label}: {state}"), theme.sidebar_style),
    ])
}

fn draw_sidebar(f: &mut Frame, session: &Session, theme: &Theme, area: Rect, now: Instant) {
    let mut lines = vec![
        Line::from(Span::styled(format!(" {APP_TITLE}"), theme.title_style)),
        Line::default(),
    ];

    for (index, section) in Section::ALL.iter().enumerate() {
        let style = if *section == session.layout.active_section {
            theme.sidebar_active_style
        } else {
            theme.sidebar_style
        };
        lines.push(Line::from(Span::styled(
            format!(" F{} {:<12}", index + 1, section.label()),
            style,
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(" ^N New chat", theme.sidebar_style)));
    if session.layout.saved_feedback_active(now) {
        lines.push(Line::from(Span::styled(" ^S Saved!", theme.saved_style)));
    } else {
        lines.push(Line::from(Span::styled(" ^S Settings", theme.sidebar_style)));
    }

    lines.push(Line::default());
    lines.push(status_span(
        "Server",
        session.health.server_reachable,
        &session.health,
        theme,
    ));
    lines.push(status_span(
        "Index",
        session.health.index_connected,
        &session.health,
        theme,
    ));

    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::RIGHT)
            .border_style(theme.hint_style),
    );
    f.render_widget(sidebar, area);
}

fn draw_about(f: &mut Frame, view: &ViewState, theme: &Theme, area: Rect, narrow: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    f.render_widget(Paragraph::new(header_line(theme, narrow, "About")), chunks[0]);

    let heading = |text: &str| Line::from(Span::styled(text.to_string(), theme.heading_style));
    let text = |text: &str| Line::from(Span::styled(text.to_string(), theme.assistant_text_style));

    let lines = vec![
        Line::default(),
        heading("About"),
        text("MedAssist answers hematology questions with retrieval-augmented generation: your question is matched against indexed medical documents and the closest passages are handed to a language model together with the question."),
        Line::default(),
        heading("Sources"),
        text("Every answer lists the passages it was built from, with the document name, page and similarity score. Press Ctrl+O to expand them."),
        Line::default(),
        heading("API key"),
        text("An optional model provider key can be stored in Settings (Ctrl+S). It is kept in the system keyring and sent with each question."),
        Line::default(),
        heading("Backend"),
        Line::from(vec![
            Span::styled("Server: ", theme.hint_style),
            Span::styled(view.server_url.clone(), theme.link_style),
        ]),
        Line::default(),
        heading("Keys"),
        text("Enter send · Shift+Enter newline · Ctrl+N new chat · Ctrl+S settings · Ctrl+B menu · F1/F2 sections · Alt+1..3 suggestions · Ctrl+O sources · Ctrl+Up/Down pick answer · PgUp/PgDn scroll · Ctrl+C quit"),
        Line::default(),
        Line::from(Span::styled(
            "Informational only; not a substitute for professional medical advice.",
            theme.hint_style.add_modifier(Modifier::ITALIC),
        )),
    ];

    let inner = Rect {
        x: chunks[1].x + 2,
        width: chunks[1].width.saturating_sub(4),
        ..chunks[1]
    };
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

/// A `width` x `height` rectangle centered in `area`, clamped to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_settings(f: &mut Frame, session: &Session, theme: &Theme, area: Rect, now: Instant) {
    let modal = centered_rect(64, 10, area);
    f.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.modal_border_style)
        .title(" Settings ");
    let inner = block.inner(modal);
    f.render_widget(block, modal);

    let options = LineEditorOptions::secret();
    let field = &session.layout.key_field;
    let masked = display_text(field, &options);
    let field_width = inner.width.saturating_sub(2);
    let visible_start = field.cursor.saturating_sub(usize::from(field_width.saturating_sub(1)));
    let visible: String = masked.chars().skip(visible_start).collect();

    let status = if let Some(error) = session.layout.settings_error.as_deref() {
        Line::from(Span::styled(error.to_string(), theme.error_style))
    } else if session.layout.saved_feedback_active(now) {
        Line::from(Span::styled("Saved!", theme.saved_style))
    } else {
        Line::default()
    };

    let lines = vec![
        Line::from(Span::styled(
            "API key (optional)",
            theme.heading_style,
        )),
        Line::from(Span::styled(
            "Sent with each question. Leave empty and save to remove it.",
            theme.hint_style,
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("> ", theme.list_marker_style),
            Span::styled(visible, theme.input_text_style),
        ]),
        Line::default(),
        status,
        Line::from(Span::styled(
            "Enter save · F2 reveal last 4 · Esc close",
            theme.hint_style,
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    let cursor_col = u16::try_from(field.cursor - visible_start).unwrap_or(0);
    f.set_cursor_position((
        inner.x + 2 + cursor_col.min(field_width.saturating_sub(1)),
        inner.y + 3,
    ));
}
