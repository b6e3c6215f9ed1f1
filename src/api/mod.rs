use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod client;
pub mod error;

pub use client::{HttpBackend, MedAssistBackend};
pub use error::DispatchError;

/// Body of `POST /api/query`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Successful `/api/query` payload. `answer` is HTML rendered by the backend
/// from the model's markdown, which it also echoes as `answer_raw`.
#[derive(Deserialize, Debug, Clone)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub answer_raw: Option<String>,
    #[serde(default)]
    pub sources: Vec<ApiSource>,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApiSource {
    #[serde(default)]
    pub source: String,
    /// Usually an integer, but the backend sends `""` when the chunk has no
    /// page metadata.
    #[serde(default)]
    pub page: Value,
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub text: String,
}

impl ApiSource {
    pub fn page_number(&self) -> Option<u32> {
        match &self.page {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Body returned alongside a non-2xx status.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub endee_connected: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub indexes: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}
