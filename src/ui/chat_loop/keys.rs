use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::navigation::Section;
use crate::utils::line_editor::{map_key_event_to_action, LineEditAction, LineEditorOptions};

const PAGE_SCROLL_LINES: u16 = 10;

/// What a key press asks the chat loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Quit,
    Submit,
    NewChat,
    OpenSettings,
    ToggleSidebar,
    SelectSection(Section),
    AskSuggested(usize),
    ToggleSources,
    MoveSourcesFocus(isize),
    ScrollUp(u16),
    ScrollDown(u16),
    Edit(LineEditAction),
    SaveSettings,
    CloseSettings,
    EditKey(LineEditAction),
}

pub fn map_chat_key(key: &KeyEvent, settings_open: bool) -> Option<ChatAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl && key.code == KeyCode::Char('c') {
        return Some(ChatAction::Quit);
    }

    if settings_open {
        return match map_key_event_to_action(key, &LineEditorOptions::secret())? {
            LineEditAction::Submit => Some(ChatAction::SaveSettings),
            LineEditAction::Cancel => Some(ChatAction::CloseSettings),
            action => Some(ChatAction::EditKey(action)),
        };
    }

    match key.code {
        KeyCode::Char('n') if ctrl => return Some(ChatAction::NewChat),
        KeyCode::Char('s') if ctrl => return Some(ChatAction::OpenSettings),
        KeyCode::Char('b') if ctrl => return Some(ChatAction::ToggleSidebar),
        KeyCode::Char('o') if ctrl => return Some(ChatAction::ToggleSources),
        KeyCode::Up if ctrl => return Some(ChatAction::MoveSourcesFocus(-1)),
        KeyCode::Down if ctrl => return Some(ChatAction::MoveSourcesFocus(1)),
        KeyCode::F(1) => return Some(ChatAction::SelectSection(Section::Chat)),
        KeyCode::F(2) => return Some(ChatAction::SelectSection(Section::About)),
        KeyCode::PageUp => return Some(ChatAction::ScrollUp(PAGE_SCROLL_LINES)),
        KeyCode::PageDown => return Some(ChatAction::ScrollDown(PAGE_SCROLL_LINES)),
        KeyCode::Char(c @ '1'..='9') if alt => {
            return c
                .to_digit(10)
                .map(|digit| ChatAction::AskSuggested(digit as usize - 1));
        }
        _ => {}
    }

    match map_key_event_to_action(key, &LineEditorOptions::question())? {
        LineEditAction::Submit => Some(ChatAction::Submit),
        LineEditAction::Cancel => None,
        action => Some(ChatAction::Edit(action)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn enter_submits_and_modified_enter_inserts_newline() {
        assert_eq!(
            map_chat_key(&key(KeyCode::Enter, KeyModifiers::NONE), false),
            Some(ChatAction::Submit)
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::Enter, KeyModifiers::SHIFT), false),
            Some(ChatAction::Edit(LineEditAction::NewLine))
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::Enter, KeyModifiers::ALT), false),
            Some(ChatAction::Edit(LineEditAction::NewLine))
        );
    }

    #[test]
    fn control_shortcuts_map_to_navigation() {
        let cases = [
            ('n', ChatAction::NewChat),
            ('s', ChatAction::OpenSettings),
            ('b', ChatAction::ToggleSidebar),
            ('o', ChatAction::ToggleSources),
            ('c', ChatAction::Quit),
        ];
        for (c, expected) in cases {
            assert_eq!(
                map_chat_key(&key(KeyCode::Char(c), KeyModifiers::CONTROL), false),
                Some(expected)
            );
        }
    }

    #[test]
    fn alt_digits_pick_suggested_questions() {
        assert_eq!(
            map_chat_key(&key(KeyCode::Char('2'), KeyModifiers::ALT), false),
            Some(ChatAction::AskSuggested(1))
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::Char('2'), KeyModifiers::NONE), false),
            Some(ChatAction::Edit(LineEditAction::Insert('2')))
        );
    }

    #[test]
    fn function_keys_switch_sections() {
        assert_eq!(
            map_chat_key(&key(KeyCode::F(2), KeyModifiers::NONE), false),
            Some(ChatAction::SelectSection(Section::About))
        );
    }

    #[test]
    fn settings_modal_captures_editing_keys() {
        assert_eq!(
            map_chat_key(&key(KeyCode::Enter, KeyModifiers::NONE), true),
            Some(ChatAction::SaveSettings)
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::Esc, KeyModifiers::NONE), true),
            Some(ChatAction::CloseSettings)
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::F(2), KeyModifiers::NONE), true),
            Some(ChatAction::EditKey(LineEditAction::ToggleMaskReveal))
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::Char('n'), KeyModifiers::CONTROL), true),
            None
        );
        assert_eq!(
            map_chat_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Some(ChatAction::Quit)
        );
    }

    #[test]
    fn escape_does_nothing_in_the_chat_input() {
        assert_eq!(
            map_chat_key(&key(KeyCode::Esc, KeyModifiers::NONE), false),
            None
        );
    }
}
