use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub background_color: Color,

    // Transcript
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub notice_style: Style,
    pub loading_style: Style,

    // Sources panel
    pub sources_toggle_style: Style,
    pub sources_focus_style: Style,
    pub source_meta_style: Style,
    pub source_similarity_style: Style,
    pub source_text_style: Style,

    // Markdown
    pub heading_style: Style,
    pub inline_code_style: Style,
    pub code_block_style: Style,
    pub link_style: Style,
    pub blockquote_style: Style,
    pub list_marker_style: Style,

    // Chrome
    pub title_style: Style,
    pub sidebar_style: Style,
    pub sidebar_active_style: Style,
    pub status_ok_style: Style,
    pub status_bad_style: Style,
    pub status_pending_style: Style,
    pub hint_style: Style,
    pub input_border_style: Style,
    pub input_disabled_border_style: Style,
    pub input_text_style: Style,
    pub modal_border_style: Style,
    pub saved_style: Style,
    pub error_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}

impl Theme {
    pub fn dark_default() -> Self {
        let accent = Color::Rgb(0xe0, 0x4f, 0x5f);
        Theme {
            background_color: Color::Reset,

            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_prefix_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            notice_style: Style::default().fg(Color::LightRed),
            loading_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            sources_toggle_style: Style::default().fg(Color::Yellow),
            sources_focus_style: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            source_meta_style: Style::default().fg(Color::Gray),
            source_similarity_style: Style::default().fg(Color::Green),
            source_text_style: Style::default().fg(Color::DarkGray),

            heading_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            inline_code_style: Style::default().fg(Color::LightYellow),
            code_block_style: Style::default().fg(Color::LightYellow),
            link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            blockquote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            list_marker_style: Style::default().fg(accent),

            title_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            sidebar_style: Style::default().fg(Color::Gray),
            sidebar_active_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            status_ok_style: Style::default().fg(Color::Green),
            status_bad_style: Style::default().fg(Color::Red),
            status_pending_style: Style::default().fg(Color::DarkGray),
            hint_style: Style::default().fg(Color::DarkGray),
            input_border_style: Style::default().fg(Color::Gray),
            input_disabled_border_style: Style::default().fg(Color::DarkGray),
            input_text_style: Style::default().fg(Color::White),
            modal_border_style: Style::default().fg(accent),
            saved_style: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            error_style: Style::default().fg(Color::LightRed),
        }
    }

    pub fn heading_style_for(&self, level: u8) -> Style {
        match level {
            1 => self.heading_style.add_modifier(Modifier::UNDERLINED),
            _ => self.heading_style,
        }
    }
}
