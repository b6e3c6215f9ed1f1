//! Ordered, append-only list of chat entries.
//!
//! Entries are never edited after they are appended. The only mutation besides
//! appending is removal by id, which the dispatcher uses to retire the loading
//! placeholder before the turn's final assistant entry goes in.

use std::collections::HashSet;

use chrono::Utc;

use crate::core::message::{ChatMessage, MessageId, MessageKind, Source, TranscriptRole};

const MESSAGE_ID_PREFIX: &str = "msg";
const LOADING_ID_PREFIX: &str = "loading";

#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    /// Messages whose sources panel is expanded; absent means collapsed.
    expanded_sources: HashSet<MessageId>,
    next_sequence: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user or assistant entry and return its id.
    pub fn add_message(
        &mut self,
        role: TranscriptRole,
        content: impl Into<String>,
        sources: Option<Vec<Source>>,
    ) -> MessageId {
        self.push(
            MESSAGE_ID_PREFIX,
            role,
            MessageKind::Text,
            content.into(),
            None,
            sources.unwrap_or_default(),
        )
    }

    /// Append an assistant answer. `markup` is trusted backend HTML;
    /// `plain` is the markdown it was rendered from, when available.
    pub fn add_answer(
        &mut self,
        markup: String,
        plain: Option<String>,
        sources: Vec<Source>,
    ) -> MessageId {
        self.push(
            MESSAGE_ID_PREFIX,
            TranscriptRole::Assistant,
            MessageKind::Text,
            markup,
            plain,
            sources,
        )
    }

    pub fn add_notice(&mut self, text: impl Into<String>) -> MessageId {
        self.push(
            MESSAGE_ID_PREFIX,
            TranscriptRole::Assistant,
            MessageKind::Notice,
            text.into(),
            None,
            Vec::new(),
        )
    }

    pub fn add_loading(&mut self) -> MessageId {
        self.push(
            LOADING_ID_PREFIX,
            TranscriptRole::Assistant,
            MessageKind::Loading,
            String::new(),
            None,
            Vec::new(),
        )
    }

    /// Remove the entry with `id`. Unknown or already-removed ids are ignored.
    pub fn remove_message(&mut self, id: &MessageId) {
        self.messages.retain(|message| &message.id != id);
        self.expanded_sources.remove(id);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| &message.id == id)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_loading(&self) -> bool {
        self.messages.iter().any(ChatMessage::is_loading)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.expanded_sources.clear();
    }

    /// Flip the sources panel of one message. Returns the new state; messages
    /// without sources stay collapsed.
    pub fn toggle_sources(&mut self, id: &MessageId) -> bool {
        let has_sources = self
            .get(id)
            .map(ChatMessage::has_sources)
            .unwrap_or(false);
        if !has_sources {
            return false;
        }

        if self.expanded_sources.remove(id) {
            false
        } else {
            self.expanded_sources.insert(id.clone());
            true
        }
    }

    pub fn sources_expanded(&self, id: &MessageId) -> bool {
        self.expanded_sources.contains(id)
    }

    /// Ids of messages that carry a sources panel, oldest first.
    pub fn ids_with_sources(&self) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|message| message.has_sources())
            .map(|message| message.id.clone())
            .collect()
    }

    fn push(
        &mut self,
        prefix: &str,
        role: TranscriptRole,
        kind: MessageKind,
        content: String,
        plain: Option<String>,
        sources: Vec<Source>,
    ) -> MessageId {
        let id = MessageId::new(prefix, Utc::now().timestamp_millis(), self.next_sequence);
        self.next_sequence += 1;
        self.messages.push(ChatMessage {
            id: id.clone(),
            role,
            kind,
            content,
            plain,
            sources,
        });
        id
    }
}
