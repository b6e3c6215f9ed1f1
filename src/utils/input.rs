//! Cleanup for text that arrives by bracketed paste.

const TAB_SPACES: &str = "    ";

/// Make pasted text safe to place in an editor buffer.
///
/// Windows and old Mac line endings become `\n`, tabs become spaces, and
/// other control characters and byte-order marks are dropped so they cannot
/// move the terminal cursor.
pub fn sanitize_pasted_text(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                sanitized.push('\n');
            }
            '\n' => sanitized.push('\n'),
            '\t' => sanitized.push_str(TAB_SPACES),
            '\u{feff}' => {}
            _ if c.is_control() => {}
            _ => sanitized.push(c),
        }
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_question_is_unchanged() {
        assert_eq!(
            sanitize_pasted_text("What is hemophilia A?"),
            "What is hemophilia A?"
        );
    }

    #[test]
    fn line_endings_collapse_to_one_newline() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn tabs_expand_and_controls_drop() {
        assert_eq!(sanitize_pasted_text("dose:\t5\x07mg\x1b[2J"), "dose:    5mg[2J");
    }

    #[test]
    fn byte_order_mark_is_removed() {
        assert_eq!(sanitize_pasted_text("\u{feff}gsk_key"), "gsk_key");
    }
}
