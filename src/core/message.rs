use std::fmt;

use crate::api::ApiSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptRole {
    User,
    Assistant,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == TranscriptRole::User
    }

    pub fn is_assistant(self) -> bool {
        self == TranscriptRole::Assistant
    }
}

impl AsRef<str> for TranscriptRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for TranscriptRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TranscriptRole::User),
            "assistant" => Ok(TranscriptRole::Assistant),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for TranscriptRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranscriptRole> for String {
    fn from(value: TranscriptRole) -> Self {
        value.as_str().to_string()
    }
}

/// What an entry represents beyond its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A question or an answer.
    Text,

    /// The transient "searching..." placeholder shown while a query is in
    /// flight.
    Loading,

    /// An assistant-style error notice. Content is plain text.
    Notice,
}

/// Transcript entry identity, derived from the creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    pub(crate) fn new(prefix: &str, timestamp_millis: i64, sequence: u64) -> Self {
        Self(format!("{prefix}-{timestamp_millis}-{sequence}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cited passage from the retrieval step.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub file: String,
    pub page: Option<u32>,
    /// Cosine similarity in `0..=1`, shown as-is without validation.
    pub similarity: f64,
    pub text: String,
}

impl From<ApiSource> for Source {
    fn from(source: ApiSource) -> Self {
        let page = source.page_number();
        Self {
            file: source.source,
            page,
            similarity: source.similarity,
            text: source.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: TranscriptRole,
    pub kind: MessageKind,
    /// User text, answer markup, or notice text depending on `role`/`kind`.
    pub content: String,
    /// Markdown form of an answer, when the backend supplied one.
    pub plain: Option<String>,
    pub sources: Vec<Source>,
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_loading(&self) -> bool {
        self.kind == MessageKind::Loading
    }

    pub fn is_notice(&self) -> bool {
        self.kind == MessageKind::Notice
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}
