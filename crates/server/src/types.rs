use serde::{Deserialize, Serialize};
use studychat_llm::ModelProfile;

/// Chat request
///
/// camelCase aliases accept the browser client field names.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message
    pub message: Option<String>,

    /// Catalog model id
    pub model: Option<String>,

    /// Prior exchange strings, most recent last
    #[serde(default, alias = "conversationHistory")]
    pub conversation_history: Vec<String>,

    /// Per-request Hugging Face token
    #[serde(default, alias = "apiToken")]
    pub api_token: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Cleaned reply
    pub response: String,

    /// Model that answered
    pub model: String,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Message suitable for display
    pub error: String,

    /// Upstream diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Requested model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            model: None,
        }
    }
}

/// Token check request
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Token to check; falls back to the configured one
    #[serde(default, alias = "apiToken")]
    pub api_token: Option<String>,
}

/// Model catalog listing
#[derive(Debug, Serialize)]
pub struct ModelsResponse<'a> {
    /// Selectable models
    pub models: Vec<&'a ModelProfile>,

    /// Model selected for new conversations
    pub default: &'a str,
}
