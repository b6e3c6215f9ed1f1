//! Presentational state: which section is showing, whether the sidebar and the
//! settings modal are open. Nothing here touches the transcript or the
//! processing gate.

use std::time::{Duration, Instant};

use crate::core::constants::{NARROW_LAYOUT_COLUMNS, SAVED_FEEDBACK_MILLIS};
use crate::utils::line_editor::LineEditorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Chat,
    About,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Chat, Section::About];

    pub fn label(self) -> &'static str {
        match self {
            Section::Chat => "Chat",
            Section::About => "About",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutState {
    pub active_section: Section,
    pub sidebar_open: bool,
    pub settings_open: bool,
    /// Editable copy of the API key shown in the settings modal.
    pub key_field: LineEditorState,
    pub settings_error: Option<String>,
    saved_feedback_until: Option<Instant>,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            active_section: Section::Chat,
            sidebar_open: false,
            settings_open: false,
            key_field: LineEditorState::empty(),
            settings_error: None,
            saved_feedback_until: None,
        }
    }
}

pub fn is_narrow(width: u16) -> bool {
    width <= NARROW_LAYOUT_COLUMNS
}

impl LayoutState {
    /// Activate `section` and close the sidebar.
    pub fn select_section(&mut self, section: Section) {
        self.active_section = section;
        self.sidebar_open = false;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// A click landed outside the sidebar. On narrow layouts that closes it.
    pub fn click_outside_sidebar(&mut self, width: u16) {
        if is_narrow(width) {
            self.sidebar_open = false;
        }
    }

    pub fn sidebar_visible(&self, width: u16) -> bool {
        !is_narrow(width) || self.sidebar_open
    }

    pub fn open_settings(&mut self) {
        self.settings_open = true;
        self.settings_error = None;
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.settings_error = None;
        self.saved_feedback_until = Some(now + Duration::from_millis(SAVED_FEEDBACK_MILLIS));
    }

    pub fn saved_feedback_active(&self, now: Instant) -> bool {
        self.saved_feedback_until
            .map(|until| now < until)
            .unwrap_or(false)
    }
}
