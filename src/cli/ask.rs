//! TUI-less "ask" command

use std::error::Error;
use std::fmt::Write;

use crate::api::MedAssistBackend;
use crate::core::credentials::SettingsStore;
use crate::core::dispatch::{send_query, TurnOutcome};
use crate::core::message::ChatMessage;
use crate::core::session::Session;
use crate::ui::html::{format_page, format_similarity, render_transcript, source_preview};
use crate::utils::text::html_to_text;

/// Run a single turn through a fresh session.
pub async fn answer_question(
    question: &str,
    backend: &dyn MedAssistBackend,
    store: &SettingsStore,
) -> (Session, Option<TurnOutcome>) {
    let mut session = Session::new();
    session.input.set_text(question);
    let outcome = send_query(&mut session, backend, store).await;
    (session, outcome)
}

/// Plain-text form of an answer with its retrieved passages.
pub fn format_answer(message: &ChatMessage) -> String {
    let mut out = message
        .plain
        .as_deref()
        .map(str::trim)
        .filter(|plain| !plain.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| html_to_text(&message.content));
    out.push('\n');

    if message.has_sources() {
        let _ = writeln!(out, "\n📚 {} Sources Retrieved", message.sources.len());
        for (index, source) in message.sources.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. 📄 {} ({}) · {}",
                index + 1,
                source.file,
                format_page(source.page),
                format_similarity(source.similarity)
            );
            let preview = source_preview(&source.text).replace('\n', " ");
            let _ = writeln!(out, "     {preview}");
        }
    }
    out
}

pub async fn run_ask(
    question: Vec<String>,
    html: bool,
    backend: &dyn MedAssistBackend,
    store: &SettingsStore,
) -> Result<(), Box<dyn Error>> {
    let question = question.join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: medassist ask <question>");
        std::process::exit(2);
    }

    let (session, outcome) = answer_question(&question, backend, store).await;

    let last = session.transcript().last();
    if html {
        print!("{}", render_transcript(session.transcript()));
    } else if let Some(message) = last.filter(|message| !message.is_notice()) {
        print!("{}", format_answer(message));
    }

    if let Some(TurnOutcome::Failed(_)) = outcome {
        if let Some(notice) = last.filter(|message| message.is_notice()) {
            eprintln!("❌ {}", notice.content);
        }
        std::process::exit(1);
    }
    Ok(())
}
