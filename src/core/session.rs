//! The chat session: transcript, input field, layout and the processing gate,
//! owned by a single event loop.

use std::time::Instant;

use tracing::{debug, warn};

use crate::core::constants::SUGGESTED_QUESTIONS;
use crate::core::credentials::{CredentialError, SettingsStore};
use crate::core::health::HealthStatus;
use crate::core::message::MessageId;
use crate::core::navigation::{LayoutState, Section};
use crate::core::transcript::Transcript;
use crate::utils::line_editor::LineEditorState;

#[derive(Debug)]
pub struct Session {
    pub(crate) transcript: Transcript,
    pub input: LineEditorState,
    pub layout: LayoutState,
    pub health: HealthStatus,
    pub(crate) processing: bool,
    /// Bumped on every new chat so completions from an older conversation
    /// can be recognized.
    pub(crate) generation: u64,
    pub(crate) welcome_visible: bool,
    pub(crate) input_focused: bool,
    /// Index into [`Transcript::ids_with_sources`] for keyboard toggling.
    sources_focus: Option<usize>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            input: LineEditorState::empty(),
            layout: LayoutState::default(),
            health: HealthStatus::default(),
            processing: false,
            generation: 0,
            welcome_visible: true,
            input_focused: true,
            sources_focus: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn submit_enabled(&self) -> bool {
        !self.processing
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome_visible
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn set_input_focused(&mut self, focused: bool) {
        self.input_focused = focused;
    }

    /// Clear the conversation and return to the welcome screen.
    ///
    /// An in-flight query keeps the gate closed; its completion is dropped
    /// when it arrives.
    pub fn start_new_chat(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.transcript.clear();
        self.sources_focus = None;
        self.input.clear();
        self.welcome_visible = true;
        self.input_focused = true;
        self.layout.select_section(Section::Chat);
        debug!(generation = self.generation, "started new chat");
    }

    /// Fill the input with a preset question. Returns false for an unknown
    /// index. The caller dispatches the filled input.
    pub fn fill_suggested(&mut self, index: usize) -> bool {
        match SUGGESTED_QUESTIONS.get(index) {
            Some(question) => {
                self.layout.select_section(Section::Chat);
                self.input.set_text(*question);
                true
            }
            None => false,
        }
    }

    /// Open the settings modal with the stored key loaded into its field.
    pub fn open_settings(&mut self, store: &SettingsStore) {
        let current = match store.load_credential() {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!(recoverable = err.is_recoverable(), "{err}");
                String::new()
            }
        };
        self.layout.key_field.set_text(current);
        self.layout.open_settings();
    }

    /// Persist the key field. A blank field clears the stored key.
    pub fn save_settings(
        &mut self,
        store: &SettingsStore,
        now: Instant,
    ) -> Result<(), CredentialError> {
        match store.save_credential(&self.layout.key_field.text) {
            Ok(()) => {
                self.layout.mark_saved(now);
                Ok(())
            }
            Err(err) => {
                self.layout.settings_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn focused_sources(&self) -> Option<MessageId> {
        let ids = self.transcript.ids_with_sources();
        let index = self.sources_focus?;
        ids.get(index).cloned()
    }

    /// Move the sources focus by `delta` answers, starting from the newest.
    pub fn move_sources_focus(&mut self, delta: isize) {
        let count = self.transcript.ids_with_sources().len();
        if count == 0 {
            self.sources_focus = None;
            return;
        }
        let last = count - 1;
        let next = match self.sources_focus {
            None => last,
            Some(current) => current.min(last).saturating_add_signed(delta).min(last),
        };
        self.sources_focus = Some(next);
    }

    /// Toggle the focused answer's sources panel, defaulting to the newest
    /// answer that has sources.
    pub fn toggle_focused_sources(&mut self) -> bool {
        if self.sources_focus.is_none() {
            self.move_sources_focus(0);
        }
        match self.focused_sources() {
            Some(id) => self.transcript.toggle_sources(&id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{Source, TranscriptRole};
    use crate::core::credentials::MemoryBackend;
    use std::time::Duration;

    fn source() -> Source {
        Source {
            file: "anemia.pdf".to_string(),
            page: Some(4),
            similarity: 0.8,
            text: "Iron deficiency".to_string(),
        }
    }

    #[test]
    fn new_session_shows_welcome_with_submit_enabled() {
        let session = Session::new();
        assert!(session.welcome_visible());
        assert!(session.submit_enabled());
        assert!(session.input_focused());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn new_chat_clears_everything_but_keeps_the_gate() {
        let mut session = Session::new();
        session.transcript.add_message(TranscriptRole::User, "q", None);
        session.welcome_visible = false;
        session.processing = true;
        session.input.set_text("draft");
        session.layout.select_section(Section::About);

        session.start_new_chat();

        assert!(session.transcript().is_empty());
        assert!(session.welcome_visible());
        assert!(session.input.text.is_empty());
        assert_eq!(session.layout.active_section, Section::Chat);
        assert!(session.is_processing());
        assert_eq!(session.generation, 1);
    }

    #[test]
    fn suggested_questions_fill_the_input() {
        let mut session = Session::new();
        assert!(session.fill_suggested(0));
        assert_eq!(session.input.text, SUGGESTED_QUESTIONS[0]);
        assert!(!session.fill_suggested(SUGGESTED_QUESTIONS.len()));
    }

    #[test]
    fn settings_round_trip_through_the_store() {
        let store = SettingsStore::new(Box::new(MemoryBackend::with_value("gsk_old")));
        let mut session = Session::new();

        session.open_settings(&store);
        assert!(session.layout.settings_open);
        assert_eq!(session.layout.key_field.text, "gsk_old");

        session.layout.key_field.set_text("  gsk_new ");
        let now = Instant::now();
        session.save_settings(&store, now).unwrap();
        assert_eq!(store.load_credential().unwrap().as_deref(), Some("gsk_new"));
        assert!(session.layout.saved_feedback_active(now + Duration::from_millis(100)));
    }

    #[test]
    fn saving_a_blank_key_clears_it() {
        let store = SettingsStore::new(Box::new(MemoryBackend::with_value("gsk_old")));
        let mut session = Session::new();
        session.open_settings(&store);
        session.layout.key_field.clear();
        session.save_settings(&store, Instant::now()).unwrap();
        assert_eq!(store.load_credential().unwrap(), None);
    }

    #[test]
    fn sources_focus_starts_at_newest_and_clamps() {
        let mut session = Session::new();
        let first = session
            .transcript
            .add_answer("<p>a</p>".into(), None, vec![source()]);
        session.transcript.add_notice("no sources here");
        let second = session
            .transcript
            .add_answer("<p>b</p>".into(), None, vec![source()]);

        assert!(session.toggle_focused_sources());
        assert!(session.transcript().sources_expanded(&second));
        assert!(!session.transcript().sources_expanded(&first));

        session.move_sources_focus(-5);
        assert_eq!(session.focused_sources(), Some(first.clone()));
        session.move_sources_focus(9);
        assert_eq!(session.focused_sources(), Some(second));
    }

    #[test]
    fn toggling_sources_without_answers_is_a_no_op() {
        let mut session = Session::new();
        assert!(!session.toggle_focused_sources());
        assert_eq!(session.focused_sources(), None);
    }
}
