//! Markdown to terminal lines for assistant answers.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;
use crate::ui::wrap::wrap_spans;

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct MarkdownRenderer<'a> {
    theme: &'a Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    /// Marker for the next flushed line of the current list item.
    pending_marker: Option<String>,
    quote_depth: usize,
    code_block: Option<Vec<String>>,
    link_targets: Vec<String>,
    table_row: Vec<String>,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(theme: &'a Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![theme.assistant_text_style],
            list_stack: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            code_block: None,
            link_targets: Vec::new(),
            table_row: Vec::new(),
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or(self.theme.assistant_text_style)
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.current_style().patch(patch);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn quote_prefix(&self) -> String {
        "│ ".repeat(self.quote_depth)
    }

    fn list_indent(&self) -> String {
        "   ".repeat(self.list_stack.len().saturating_sub(1))
    }

    fn flush(&mut self) {
        let marker = self.pending_marker.take();
        if self.spans.is_empty() && marker.is_none() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let base = format!("{}{}", self.quote_prefix(), self.list_indent());
        let (first, rest) = match marker {
            Some(marker) => {
                let pad = " ".repeat(marker.chars().count());
                (
                    vec![
                        Span::styled(self.quote_prefix(), self.theme.blockquote_style),
                        Span::raw(self.list_indent()),
                        Span::styled(marker, self.theme.list_marker_style),
                    ],
                    format!("{base}{pad}"),
                )
            }
            None if !self.list_stack.is_empty() => {
                let rest = format!("{base}   ");
                (vec![Span::raw(rest.clone())], rest)
            }
            None => (
                vec![Span::styled(base.clone(), self.theme.blockquote_style)],
                base,
            ),
        };

        let first_text: String = first.iter().map(|span| span.content.as_ref()).collect();
        let mut wrapped = wrap_spans(
            &spans,
            self.width,
            Span::raw(first_text),
            Span::styled(rest, self.theme.blockquote_style),
        );
        // Restore the styled prefix pieces on the first line.
        if let Some(line) = wrapped.first_mut() {
            if !line.spans.is_empty() {
                line.spans.remove(0);
            }
            for (index, span) in first.into_iter().enumerate() {
                line.spans.insert(index, span);
            }
        }
        self.lines.extend(wrapped);
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn render(mut self, markdown: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => {
                    if let Some(block) = self.code_block.as_mut() {
                        block.push(text.to_string());
                    } else if !self.table_row.is_empty() {
                        if let Some(cell) = self.table_row.last_mut() {
                            cell.push_str(&text);
                        }
                    } else {
                        let style = self.current_style();
                        self.spans.push(Span::styled(text.to_string(), style));
                    }
                }
                Event::Code(code) => {
                    if let Some(cell) = self.table_row.last_mut() {
                        cell.push_str(&code);
                    } else {
                        self.spans
                            .push(Span::styled(code.to_string(), self.theme.inline_code_style));
                    }
                }
                Event::SoftBreak => {
                    let style = self.current_style();
                    self.spans.push(Span::styled(" ", style));
                }
                Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.flush();
                    let width = if self.width == 0 { 40 } else { self.width.min(40) };
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(width),
                        self.theme.hint_style,
                    )));
                    self.lines.push(Line::default());
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.spans
                        .push(Span::styled(marker, self.theme.list_marker_style));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.current_style();
                    self.spans.push(Span::styled(html.to_string(), style));
                }
                _ => {}
            }
        }

        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let style = self.theme.heading_style_for(level as u8);
                self.style_stack.push(style);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(self.theme.blockquote_style);
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::from(Span::styled(
                            format!("  {lang}"),
                            self.theme.hint_style,
                        )));
                    }
                }
                self.code_block = Some(Vec::new());
            }
            Tag::List(start) => {
                self.flush();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let current = *n;
                        *n += 1;
                        format!("{current}. ")
                    }
                    _ => "• ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.push_style(self.theme.link_style);
                self.link_targets.push(dest_url.to_string());
            }
            Tag::Table(_) => self.flush(),
            Tag::TableRow | Tag::TableHead => self.table_row.clear(),
            Tag::TableCell => self.table_row.push(String::new()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
                self.blank_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                let block = self.code_block.take().unwrap_or_default();
                let text = block.concat();
                for line in text.trim_end_matches('\n').split('\n') {
                    self.lines.push(Line::from(Span::styled(
                        format!("  {line}"),
                        self.theme.code_block_style,
                    )));
                }
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_targets.pop() {
                    let shown: String = self.spans.iter().map(|s| s.content.as_ref()).collect();
                    if !shown.ends_with(url.as_str()) {
                        self.spans
                            .push(Span::styled(format!(" <{url}>"), self.theme.hint_style));
                    }
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                let row = std::mem::take(&mut self.table_row);
                let style = if matches!(tag, TagEnd::TableHead) {
                    self.current_style().add_modifier(Modifier::BOLD)
                } else {
                    self.current_style()
                };
                self.spans.push(Span::styled(row.join(" │ "), style));
                self.flush();
            }
            TagEnd::Table => self.blank_line(),
            _ => {}
        }
    }
}

/// Render `markdown` into wrapped lines no wider than `width` columns.
/// A width of zero disables wrapping.
pub fn render_markdown(markdown: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme, width).render(markdown)
}
