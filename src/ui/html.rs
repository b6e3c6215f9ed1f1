//! HTML rendering of a transcript.
//!
//! User text, notice text and source passages are escaped. Assistant answers
//! are backend-generated markup and are inserted verbatim.

use std::fmt::Write;

use crate::core::constants::{APP_TITLE, LOADING_TEXT, SOURCE_PREVIEW_CHARS, TRUNCATION_MARKER};
use crate::core::message::{ChatMessage, MessageKind, Source};
use crate::core::transcript::Transcript;

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Similarity as a percentage with one decimal place, e.g. `84.2% match`.
pub fn format_similarity(similarity: f64) -> String {
    format!("{:.1}% match", similarity * 100.0)
}

/// The first [`SOURCE_PREVIEW_CHARS`] characters of a passage, with a marker
/// appended only when something was cut.
pub fn source_preview(text: &str) -> String {
    let mut chars = text.chars();
    let preview: String = chars.by_ref().take(SOURCE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}{TRUNCATION_MARKER}")
    } else {
        preview
    }
}

pub fn format_page(page: Option<u32>) -> String {
    match page {
        Some(page) => format!("Page {page}"),
        None => "Page n/a".to_string(),
    }
}

fn render_source(out: &mut String, source: &Source) {
    let _ = write!(
        out,
        concat!(
            "<div class=\"source-item\">",
            "<div class=\"source-meta\">",
            "<span class=\"source-file\">📄 {file} ({page})</span>",
            "<span class=\"source-similarity\">{similarity}</span>",
            "</div>",
            "<div class=\"source-text\">{text}</div>",
            "</div>"
        ),
        file = escape_html(&source.file),
        page = format_page(source.page),
        similarity = format_similarity(source.similarity),
        text = escape_html(&source_preview(&source.text)),
    );
}

fn render_sources(out: &mut String, sources: &[Source], expanded: bool) {
    let state = if expanded { " open" } else { "" };
    let _ = write!(
        out,
        "<div class=\"sources-panel{state}\"><div class=\"sources-toggle\">📚 {} Sources Retrieved</div><div class=\"sources-list\">",
        sources.len()
    );
    for source in sources {
        render_source(out, source);
    }
    out.push_str("</div></div>");
}

/// Render one transcript entry. `expanded` controls the sources panel state.
pub fn render_message(message: &ChatMessage, expanded: bool) -> String {
    let mut out = String::new();
    let (class, sender) = if message.is_user() {
        ("user", "You")
    } else {
        ("assistant", APP_TITLE)
    };

    let _ = write!(
        out,
        "<div class=\"message {class}\" id=\"{}\"><div class=\"message-header\"><span class=\"message-sender\">{sender}</span></div><div class=\"message-body\"><div class=\"message-content\">",
        escape_html(message.id.as_str())
    );

    match message.kind {
        MessageKind::Loading => {
            let _ = write!(
                out,
                "<div class=\"typing-indicator\"></div><span class=\"loading-text\">{}</span>",
                escape_html(LOADING_TEXT)
            );
        }
        MessageKind::Notice => {
            let _ = write!(out, "<p>❌ {}</p>", escape_html(&message.content));
        }
        MessageKind::Text if message.is_user() => {
            let _ = write!(out, "<p>{}</p>", escape_html(&message.content));
        }
        MessageKind::Text => out.push_str(&message.content),
    }
    out.push_str("</div>");

    if message.has_sources() {
        render_sources(&mut out, &message.sources, expanded);
    }
    out.push_str("</div></div>");
    out
}

/// Render every entry in order, wrapped in a container element.
pub fn render_transcript(transcript: &Transcript) -> String {
    let mut out = String::from("<div class=\"chat-messages\">");
    for message in transcript.messages() {
        out.push_str(&render_message(
            message,
            transcript.sources_expanded(&message.id),
        ));
    }
    out.push_str("</div>");
    out
}
