//! Text editing state shared by the question field, the settings key field,
//! and the interactive `medassist key set` prompt.
//!
//! The cursor is a char index into `text`. Every edit reports whether it
//! changed anything so callers can skip redraws.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::utils::input::sanitize_pasted_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEditorState {
    pub text: String,
    pub cursor: usize,
    /// Show the last few characters of a masked value.
    pub reveal_mask_tail: bool,
}

impl LineEditorState {
    pub fn with_text(text: String) -> Self {
        let cursor = text.chars().count();
        Self {
            text,
            cursor,
            reveal_mask_tail: false,
        }
    }

    pub fn empty() -> Self {
        Self::with_text(String::new())
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Self::with_text(text.into());
    }

    pub fn clear(&mut self) {
        self.set_text(String::new());
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(idx, _)| idx)
    }

    fn insert_str(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let at = self.byte_at(self.cursor);
        self.text.insert_str(at, text);
        self.cursor += text.chars().count();
        self.reveal_mask_tail = false;
        true
    }

    /// Remove the chars in `start..end` (char indices) and park the cursor at `start`.
    fn remove_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        let (from, to) = (self.byte_at(start), self.byte_at(end));
        self.text.replace_range(from..to, "");
        self.cursor = start;
        self.reveal_mask_tail = false;
        true
    }

    fn move_to(&mut self, cursor: usize) -> bool {
        let cursor = cursor.min(self.len());
        let moved = cursor != self.cursor;
        self.cursor = cursor;
        moved
    }

    fn word_start_before_cursor(&self) -> usize {
        let before: Vec<char> = self.text.chars().take(self.cursor).collect();
        let mut idx = before.len();
        while idx > 0 && before[idx - 1].is_whitespace() {
            idx -= 1;
        }
        while idx > 0 && !before[idx - 1].is_whitespace() {
            idx -= 1;
        }
        idx
    }

    /// Rows the text occupies when soft-wrapped at `width` columns, clamped to
    /// `1..=max_rows`.
    pub fn visual_rows(&self, width: u16, max_rows: u16) -> u16 {
        let width = usize::from(width.max(1));
        let rows: usize = self
            .text
            .split('\n')
            .map(|line| UnicodeWidthStr::width(line).div_ceil(width).max(1))
            .sum();
        u16::try_from(rows).unwrap_or(u16::MAX).clamp(1, max_rows.max(1))
    }

    /// Cursor position as (column, row) within the soft-wrapped text.
    pub fn cursor_position(&self, width: u16) -> (u16, u16) {
        let width = usize::from(width.max(1));
        let (mut column, mut row) = (0_usize, 0_usize);
        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                column = 0;
                row += 1;
                continue;
            }
            let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
            if column + char_width > width {
                column = 0;
                row += 1;
            }
            column += char_width;
        }
        if column >= width {
            column = 0;
            row += 1;
        }
        (
            u16::try_from(column).unwrap_or(u16::MAX),
            u16::try_from(row).unwrap_or(u16::MAX),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskMode {
    None,
    Hidden,
    RevealTail { tail_chars: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEditorOptions {
    pub initial_text: String,
    pub allow_cancel: bool,
    pub mask_mode: MaskMode,
    /// Shift+Enter / Alt+Enter insert a newline and pastes keep theirs.
    pub multiline: bool,
}

impl Default for LineEditorOptions {
    fn default() -> Self {
        Self {
            initial_text: String::new(),
            allow_cancel: true,
            mask_mode: MaskMode::None,
            multiline: false,
        }
    }
}

impl LineEditorOptions {
    /// The chat question field: multi-line, never cancelled.
    pub fn question() -> Self {
        Self {
            allow_cancel: false,
            multiline: true,
            ..Self::default()
        }
    }

    /// An API key field: masked, last four characters revealable with F2.
    pub fn secret() -> Self {
        Self {
            mask_mode: MaskMode::RevealTail { tail_chars: 4 },
            ..Self::default()
        }
    }

    fn reveals_tail(&self) -> bool {
        matches!(self.mask_mode, MaskMode::RevealTail { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEditAction {
    Insert(char),
    NewLine,
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveStart,
    MoveEnd,
    DeleteToEnd,
    DeleteWord,
    ClearAll,
    ToggleMaskReveal,
    Paste(String),
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEditOutcome {
    Continue { redraw: bool },
    Submit(String),
    Cancelled,
}

impl LineEditOutcome {
    fn redraw_if(changed: bool) -> Self {
        LineEditOutcome::Continue { redraw: changed }
    }
}

#[derive(Debug)]
pub enum LineEditorError {
    Cancelled,
    Terminal(io::Error),
}

impl fmt::Display for LineEditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEditorError::Cancelled => write!(f, "cancelled"),
            LineEditorError::Terminal(err) => write!(f, "terminal error: {err}"),
        }
    }
}

impl std::error::Error for LineEditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LineEditorError::Cancelled => None,
            LineEditorError::Terminal(err) => Some(err),
        }
    }
}

impl From<io::Error> for LineEditorError {
    fn from(err: io::Error) -> Self {
        LineEditorError::Terminal(err)
    }
}

/// Raw mode with bracketed paste for the lifetime of the guard.
struct RawPromptGuard;

impl RawPromptGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), event::EnableBracketedPaste) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        Ok(Self)
    }
}

impl Drop for RawPromptGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), event::DisableBracketedPaste);
        let _ = disable_raw_mode();
        println!();
    }
}

/// Read one value on the current terminal line.
pub fn prompt_line_editor(
    prompt: &str,
    options: &LineEditorOptions,
) -> Result<String, LineEditorError> {
    let _guard = RawPromptGuard::enter()?;
    let mut state = LineEditorState::with_text(options.initial_text.clone());
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            redraw_line(prompt, &state, options)?;
        }
        if !event::poll(Duration::from_millis(100))? {
            needs_redraw = false;
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                map_key_event_to_action(&key, options)
            }
            Event::Paste(text) => Some(LineEditAction::Paste(sanitize_pasted_text(&text))),
            _ => None,
        };
        let Some(action) = action else {
            needs_redraw = false;
            continue;
        };

        match apply_line_edit_action(&mut state, action, options) {
            LineEditOutcome::Continue { redraw } => needs_redraw = redraw,
            LineEditOutcome::Submit(value) => return Ok(value),
            LineEditOutcome::Cancelled => return Err(LineEditorError::Cancelled),
        }
    }
}

fn redraw_line(
    prompt: &str,
    state: &LineEditorState,
    options: &LineEditorOptions,
) -> io::Result<()> {
    let shown = display_text(state, options);
    let before_cursor: String = shown.chars().take(state.cursor).collect();
    let cursor_columns =
        UnicodeWidthStr::width(prompt) + UnicodeWidthStr::width(before_cursor.as_str());

    let mut stdout = io::stdout();
    write!(stdout, "\r\x1b[K{prompt}{shown}\r")?;
    if cursor_columns > 0 {
        write!(stdout, "\x1b[{cursor_columns}C")?;
    }
    stdout.flush()
}

/// The field's text as it should appear on screen under `options.mask_mode`.
pub fn display_text(state: &LineEditorState, options: &LineEditorOptions) -> String {
    let len = state.len();
    match options.mask_mode {
        MaskMode::None => state.text.clone(),
        MaskMode::RevealTail { tail_chars } if state.reveal_mask_tail && len >= tail_chars => {
            let hidden = len - tail_chars;
            let tail: String = state.text.chars().skip(hidden).collect();
            format!("{}{tail}", "*".repeat(hidden))
        }
        MaskMode::Hidden | MaskMode::RevealTail { .. } => "*".repeat(len),
    }
}

pub fn map_key_event_to_action(
    key: &KeyEvent,
    options: &LineEditorOptions,
) -> Option<LineEditAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let newline_modifier = key
        .modifiers
        .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);

    let action = match key.code {
        KeyCode::Enter if options.multiline && newline_modifier => LineEditAction::NewLine,
        KeyCode::Enter => LineEditAction::Submit,
        KeyCode::Esc if options.allow_cancel => LineEditAction::Cancel,
        KeyCode::Backspace => LineEditAction::Backspace,
        KeyCode::Delete => LineEditAction::Delete,
        KeyCode::Left => LineEditAction::MoveLeft,
        KeyCode::Right => LineEditAction::MoveRight,
        KeyCode::Home => LineEditAction::MoveStart,
        KeyCode::End => LineEditAction::MoveEnd,
        KeyCode::F(2) if options.reveals_tail() => LineEditAction::ToggleMaskReveal,
        KeyCode::Char(c) if ctrl => match c {
            'a' => LineEditAction::MoveStart,
            'e' => LineEditAction::MoveEnd,
            'k' => LineEditAction::DeleteToEnd,
            'w' => LineEditAction::DeleteWord,
            'u' => LineEditAction::ClearAll,
            'c' if options.allow_cancel => LineEditAction::Cancel,
            _ => return None,
        },
        KeyCode::Char('\n' | '\r') => LineEditAction::Submit,
        KeyCode::Char(c) => LineEditAction::Insert(c),
        _ => return None,
    };
    Some(action)
}

pub fn apply_line_edit_action(
    state: &mut LineEditorState,
    action: LineEditAction,
    options: &LineEditorOptions,
) -> LineEditOutcome {
    let changed = match action {
        LineEditAction::Insert(c) => state.insert_str(c.encode_utf8(&mut [0; 4])),
        LineEditAction::NewLine => options.multiline && state.insert_str("\n"),
        LineEditAction::Backspace => {
            let cursor = state.cursor;
            state.remove_range(cursor.saturating_sub(1), cursor)
        }
        LineEditAction::Delete => {
            let cursor = state.cursor;
            state.remove_range(cursor, (cursor + 1).min(state.len()))
        }
        LineEditAction::MoveLeft => state.move_to(state.cursor.saturating_sub(1)),
        LineEditAction::MoveRight => state.move_to(state.cursor + 1),
        LineEditAction::MoveStart => state.move_to(0),
        LineEditAction::MoveEnd => state.move_to(state.len()),
        LineEditAction::DeleteToEnd => {
            let cursor = state.cursor;
            state.remove_range(cursor, state.len())
        }
        LineEditAction::DeleteWord => {
            let start = state.word_start_before_cursor();
            state.remove_range(start, state.cursor)
        }
        LineEditAction::ClearAll => state.remove_range(0, state.len()),
        LineEditAction::ToggleMaskReveal => {
            if options.reveals_tail() {
                state.reveal_mask_tail = !state.reveal_mask_tail;
            }
            options.reveals_tail()
        }
        LineEditAction::Paste(text) if options.multiline => state.insert_str(&text),
        LineEditAction::Paste(text) => {
            // Single-line fields take the first line and treat the break as Enter.
            let (first_line, rest) = match text.split_once('\n') {
                Some((first, _)) => (first, true),
                None => (text.as_str(), false),
            };
            let changed = state.insert_str(first_line);
            if rest {
                return LineEditOutcome::Submit(state.text.clone());
            }
            changed
        }
        LineEditAction::Submit => return LineEditOutcome::Submit(state.text.clone()),
        LineEditAction::Cancel => return LineEditOutcome::Cancelled,
    };
    LineEditOutcome::redraw_if(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(state: &mut LineEditorState, action: LineEditAction) -> LineEditOutcome {
        apply_line_edit_action(state, action, &LineEditorOptions::default())
    }

    #[test]
    fn typing_inserts_at_the_cursor() {
        let mut state = LineEditorState::empty();
        assert_eq!(
            apply(&mut state, LineEditAction::Insert('A')),
            LineEditOutcome::Continue { redraw: true }
        );
        apply(&mut state, LineEditAction::MoveLeft);
        apply(&mut state, LineEditAction::Insert('é'));
        assert_eq!(state.text, "éA");
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn edits_at_the_edges_do_not_redraw() {
        let mut state = LineEditorState::with_text("dose".to_string());
        let idle = LineEditOutcome::Continue { redraw: false };
        assert_eq!(apply(&mut state, LineEditAction::MoveRight), idle);
        assert_eq!(apply(&mut state, LineEditAction::Delete), idle);
        assert_eq!(apply(&mut state, LineEditAction::DeleteToEnd), idle);
        state.cursor = 0;
        assert_eq!(apply(&mut state, LineEditAction::Backspace), idle);
        assert_eq!(apply(&mut state, LineEditAction::DeleteWord), idle);
        assert_eq!(state.text, "dose");
    }

    #[test]
    fn ctrl_k_deletes_to_end() {
        let mut state = LineEditorState::with_text("factor VIII".to_string());
        state.cursor = 7;
        apply(&mut state, LineEditAction::DeleteToEnd);
        assert_eq!(state.text, "factor ");
        assert_eq!(state.cursor, 7);
    }

    #[test]
    fn ctrl_w_deletes_the_previous_word_and_its_trailing_space() {
        let mut state = LineEditorState::with_text("what is hemophilia ".to_string());
        apply(&mut state, LineEditAction::DeleteWord);
        assert_eq!(state.text, "what is ");
        assert_eq!(state.cursor, 8);
    }

    #[test]
    fn single_line_paste_submits_at_the_first_break() {
        let mut state = LineEditorState::empty();
        let outcome = apply(&mut state, LineEditAction::Paste("token\nextra".to_string()));
        assert_eq!(outcome, LineEditOutcome::Submit("token".to_string()));
    }

    #[test]
    fn multiline_paste_keeps_newlines_without_submitting() {
        let mut state = LineEditorState::empty();
        let outcome = apply_line_edit_action(
            &mut state,
            LineEditAction::Paste("first\nsecond".to_string()),
            &LineEditorOptions::question(),
        );
        assert_eq!(outcome, LineEditOutcome::Continue { redraw: true });
        assert_eq!(state.text, "first\nsecond");
        assert_eq!(state.cursor, 12);
    }

    #[test]
    fn newline_is_ignored_in_single_line_fields() {
        let mut state = LineEditorState::with_text("key".to_string());
        assert_eq!(
            apply(&mut state, LineEditAction::NewLine),
            LineEditOutcome::Continue { redraw: false }
        );
        assert_eq!(state.text, "key");
    }

    #[test]
    fn control_shortcuts_map_to_editing_actions() {
        let options = LineEditorOptions::default();
        let cases = [
            ('a', LineEditAction::MoveStart),
            ('e', LineEditAction::MoveEnd),
            ('k', LineEditAction::DeleteToEnd),
            ('w', LineEditAction::DeleteWord),
            ('u', LineEditAction::ClearAll),
            ('c', LineEditAction::Cancel),
        ];
        for (c, expected) in cases {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
            assert_eq!(map_key_event_to_action(&key, &options), Some(expected));
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            map_key_event_to_action(&ctrl_c, &LineEditorOptions::question()),
            None
        );
    }

    #[test]
    fn f2_maps_to_toggle_only_with_reveal_tail_mask() {
        let f2 = KeyEvent::new(KeyCode::F(2), KeyModifiers::NONE);
        assert_eq!(
            map_key_event_to_action(&f2, &LineEditorOptions::default()),
            None
        );
        assert_eq!(
            map_key_event_to_action(&f2, &LineEditorOptions::secret()),
            Some(LineEditAction::ToggleMaskReveal)
        );
    }

    #[test]
    fn masked_display_can_reveal_tail() {
        let options = LineEditorOptions::secret();
        let mut state = LineEditorState::with_text("gsk_abcdefgh".to_string());
        assert_eq!(display_text(&state, &options), "************");
        apply_line_edit_action(&mut state, LineEditAction::ToggleMaskReveal, &options);
        assert_eq!(display_text(&state, &options), "********efgh");
        apply_line_edit_action(&mut state, LineEditAction::Insert('9'), &options);
        assert!(!state.reveal_mask_tail, "typing hides the tail again");
    }

    #[test]
    fn short_secrets_stay_fully_masked() {
        let options = LineEditorOptions::secret();
        let mut state = LineEditorState::with_text("abc".to_string());
        state.reveal_mask_tail = true;
        assert_eq!(display_text(&state, &options), "***");
    }

    #[test]
    fn shift_enter_inserts_newline_only_in_multiline_mode() {
        let shift_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT);
        let plain_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        let question = LineEditorOptions::question();

        assert_eq!(
            map_key_event_to_action(&shift_enter, &question),
            Some(LineEditAction::NewLine)
        );
        assert_eq!(
            map_key_event_to_action(&plain_enter, &question),
            Some(LineEditAction::Submit)
        );
        assert_eq!(
            map_key_event_to_action(&shift_enter, &LineEditorOptions::default()),
            Some(LineEditAction::Submit)
        );
    }

    #[test]
    fn visual_rows_grow_with_content_and_cap() {
        let mut state = LineEditorState::empty();
        assert_eq!(state.visual_rows(10, 5), 1);

        state.set_text("0123456789abc");
        assert_eq!(state.visual_rows(10, 5), 2);

        state.set_text("a\nb\nc\nd\ne\nf\ng");
        assert_eq!(state.visual_rows(10, 5), 5);
    }

    #[test]
    fn cursor_position_follows_wraps_and_newlines() {
        let mut state = LineEditorState::with_text("abc\nde".to_string());
        assert_eq!(state.cursor_position(10), (2, 1));

        state.set_text("0123456789ab");
        assert_eq!(state.cursor_position(10), (2, 1));
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        let mut state = LineEditorState::with_text("  \n\t".to_string());
        assert!(state.is_blank());
        state.clear();
        assert!(state.is_blank());
        assert_eq!(state.cursor, 0);
    }
}
