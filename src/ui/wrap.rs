use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Greedy word wrap of styled spans.
///
/// `first_prefix` starts the first line and `rest_prefix` every continuation
/// line; both count toward `max_width`. Words wider than a whole line are split
/// by character. A `max_width` of zero disables wrapping.
pub fn wrap_spans(
    spans: &[Span<'static>],
    max_width: usize,
    first_prefix: Span<'static>,
    rest_prefix: Span<'static>,
) -> Vec<Line<'static>> {
    let max_width = if max_width == 0 { usize::MAX } else { max_width };
    let rest_width = rest_prefix.content.width();

    let mut lines = Vec::new();
    let mut current_width = first_prefix.content.width();
    let mut current: Vec<Span<'static>> = vec![first_prefix];
    let mut has_text = false;

    for span in spans {
        for piece in split_words(&span.content) {
            let is_space = piece.chars().all(char::is_whitespace);
            let piece_width = piece.width();

            if is_space {
                if has_text && current_width + piece_width <= max_width {
                    push_piece(&mut current, piece, span.style);
                    current_width += piece_width;
                }
                continue;
            }

            if has_text && current_width + piece_width > max_width {
                trim_trailing_space(&mut current);
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(rest_prefix.clone());
                current_width = rest_width;
                has_text = false;
            }

            if current_width + piece_width <= max_width {
                push_piece(&mut current, piece, span.style);
                current_width += piece_width;
                has_text = true;
                continue;
            }

            // A single word longer than the line: split it by character.
            let mut chunk = String::new();
            for c in piece.chars() {
                let char_width = c.width().unwrap_or(0);
                if current_width + char_width > max_width && (has_text || !chunk.is_empty()) {
                    push_piece(&mut current, &chunk, span.style);
                    chunk.clear();
                    lines.push(Line::from(std::mem::take(&mut current)));
                    current.push(rest_prefix.clone());
                    current_width = rest_width;
                    has_text = false;
                }
                chunk.push(c);
                current_width += char_width;
            }
            if !chunk.is_empty() {
                push_piece(&mut current, &chunk, span.style);
                has_text = true;
            }
        }
    }

    trim_trailing_space(&mut current);
    lines.push(Line::from(current));
    lines
}

/// Wrap plain text line by line, keeping explicit newlines.
pub fn wrap_text(text: &str, style: Style, max_width: usize, indent: &str) -> Vec<Line<'static>> {
    text.split('\n')
        .flat_map(|line| {
            wrap_spans(
                &[Span::styled(line.to_string(), style)],
                max_width,
                Span::raw(indent.to_string()),
                Span::raw(indent.to_string()),
            )
        })
        .collect()
}

fn push_piece(current: &mut Vec<Span<'static>>, piece: &str, style: Style) {
    if piece.is_empty() {
        return;
    }
    let len = current.len();
    if let Some(last) = current.last_mut() {
        if last.style == style && !last.content.is_empty() && len > 1 {
            last.content.to_mut().push_str(piece);
            return;
        }
    }
    current.push(Span::styled(piece.to_string(), style));
}

fn trim_trailing_space(current: &mut [Span<'static>]) {
    if current.len() < 2 {
        return;
    }
    if let Some(last) = current.last_mut() {
        let trimmed = last.content.trim_end().len();
        if trimmed != last.content.len() {
            last.content.to_mut().truncate(trimmed);
        }
    }
}

/// Split into alternating runs of whitespace and non-whitespace.
fn split_words(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (index, c) in text.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(previous) if previous != space => {
                pieces.push(&text[start..index]);
                start = index;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap_spans(
            &[Span::raw("iron deficiency anemia")],
            10,
            Span::raw(""),
            Span::raw(""),
        );
        assert_eq!(plain(&lines), vec!["iron", "deficiency", "anemia"]);
    }

    #[test]
    fn prefixes_count_toward_width() {
        let lines = wrap_spans(
            &[Span::raw("aa bb cc")],
            6,
            Span::raw("- "),
            Span::raw("  "),
        );
        assert_eq!(plain(&lines), vec!["- aa", "  bb", "  cc"]);
    }

    #[test]
    fn long_words_are_split() {
        let lines = wrap_spans(&[Span::raw("abcdefgh")], 3, Span::raw(""), Span::raw(""));
        assert_eq!(plain(&lines), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn zero_width_disables_wrapping() {
        let lines = wrap_spans(
            &[Span::raw("one two three")],
            0,
            Span::raw(""),
            Span::raw(""),
        );
        assert_eq!(plain(&lines), vec!["one two three"]);
    }

    #[test]
    fn wrap_text_keeps_explicit_newlines() {
        let lines = wrap_text("a\n\nb", Style::default(), 20, "");
        assert_eq!(plain(&lines), vec!["a", "", "b"]);
    }
}
