use std::error::Error;
use std::fmt;

/// Why a backend round trip did not produce a usable payload.
///
/// The chat session recovers from both kinds locally; neither is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The backend answered with a non-success status. `message` carries the
    /// `error` field of the body when the server supplied one.
    Application { status: u16, message: Option<String> },

    /// The request never produced a decodable response: connection failure,
    /// timeout, or a body that was not the expected JSON.
    Transport { detail: String, timed_out: bool },
}

impl DispatchError {
    pub fn transport(detail: impl Into<String>) -> Self {
        DispatchError::Transport {
            detail: detail.into(),
            timed_out: false,
        }
    }

    pub fn malformed(err: serde_json::Error) -> Self {
        DispatchError::transport(format!("malformed response body: {err}"))
    }

    pub fn is_application(&self) -> bool {
        matches!(self, DispatchError::Application { .. })
    }

    /// Server-supplied error text, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            DispatchError::Application { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty()),
            DispatchError::Transport { .. } => None,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Transport {
            detail: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Application {
                status,
                message: Some(message),
            } => write!(f, "backend returned {status}: {message}"),
            DispatchError::Application {
                status,
                message: None,
            } => write!(f, "backend returned {status}"),
            DispatchError::Transport {
                detail,
                timed_out: true,
            } => write!(f, "request timed out: {detail}"),
            DispatchError::Transport { detail, .. } => write!(f, "transport error: {detail}"),
        }
    }
}

impl Error for DispatchError {}
