//! Plain-text fallback for answer markup when the backend did not send the
//! markdown it rendered from.

/// Strip tags from simple backend HTML, keeping paragraph and list structure
/// as blank lines and `- ` bullets.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        out.push_str(&decode_entities(&rest[..start]));
        let Some(end) = rest[start..].find('>') else {
            out.push_str(&decode_entities(&rest[start..]));
            rest = "";
            break;
        };
        let tag = rest[start + 1..start + end].trim();
        apply_tag(&mut out, tag);
        rest = &rest[start + end + 1..];
    }
    out.push_str(&decode_entities(rest));

    collapse_blank_lines(&out)
}

fn apply_tag(out: &mut String, tag: &str) {
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let closing = tag.starts_with('/');

    match name.as_str() {
        "br" => out.push('\n'),
        "p" | "div" | "ul" | "ol" | "pre" | "blockquote" | "table" | "h1" | "h2" | "h3"
        | "h4" | "h5" | "h6" => out.push_str("\n\n"),
        "li" if !closing => {
            if !out.ends_with('\n') && !out.is_empty() {
                out.push('\n');
            }
            out.push_str("- ");
        }
        "tr" => out.push('\n'),
        "td" | "th" if closing => out.push_str("  "),
        _ => {}
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = true;
    for line in text.lines() {
        let line = line.trim_end();
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_separated_blocks() {
        assert_eq!(
            html_to_text("<p>First.</p><p>Second &amp; last.</p>"),
            "First.\n\nSecond & last."
        );
    }

    #[test]
    fn list_items_become_bullets() {
        let text = html_to_text("<p>Symptoms:</p>\n<ul>\n<li>Fatigue</li>\n<li><strong>Pallor</strong></li>\n</ul>");
        assert_eq!(text, "Symptoms:\n\n- Fatigue\n- Pallor");
    }

    #[test]
    fn entities_decode_once() {
        assert_eq!(html_to_text("a &amp;lt; b"), "a &lt; b");
    }

    #[test]
    fn unterminated_tags_are_kept_as_text() {
        assert_eq!(html_to_text("x < y"), "x < y");
    }
}
