use serde::{Deserialize, Serialize};

use crate::catalog::ModelFamily;

/// Generation parameters sent alongside the shaped input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_new_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling threshold
    pub top_p: f32,

    /// Top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Repetition penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,

    /// End-of-sequence token id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eos_token_id: Option<u32>,

    /// Enable sampling
    pub do_sample: bool,
}

/// Resolved request for a model backend
///
/// Fields are read-only once built; `input` is what the model sees and
/// `message` is the sanitized user text that cleanup compares against.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    model_id: String,
    family: ModelFamily,
    input: String,
    message: String,
    params: GenerationParams,
}

impl GenerationRequest {
    /// Create new generation request
    pub fn new(
        model_id: impl Into<String>,
        family: ModelFamily,
        input: impl Into<String>,
        message: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            family,
            input: input.into(),
            message: message.into(),
            params,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }
}

/// Hugging Face inference request body
#[derive(Debug, Clone, Serialize)]
pub struct InferencePayload<'a> {
    /// Shaped model input
    pub inputs: &'a str,

    /// Generation parameters
    pub parameters: &'a GenerationParams,

    /// Inference API options
    pub options: InferenceOptions,
}

/// Hugging Face inference options
#[derive(Debug, Clone, Serialize)]
pub struct InferenceOptions {
    /// Block until a cold model is loaded instead of returning 503
    pub wait_for_model: bool,

    /// Disable the API response cache
    pub use_cache: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            wait_for_model: true,
            use_cache: false,
        }
    }
}

/// Result of a token check against the inference API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenStatus {
    /// Whether the token was accepted
    pub valid: bool,

    /// Upstream HTTP status when validation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Upstream error text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable summary
    pub message: String,
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateRequest<'a> {
    /// Model name
    pub model: &'a str,

    /// Prompt text
    pub prompt: &'a str,

    /// Disable streaming
    pub stream: bool,

    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Ollama generation options
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

impl From<&GenerationParams> for OllamaOptions {
    fn from(params: &GenerationParams) -> Self {
        Self {
            num_predict: Some(params.max_new_tokens),
            temperature: Some(params.temperature),
            top_p: Some(params.top_p),
            top_k: params.top_k,
            repeat_penalty: params.repetition_penalty,
        }
    }
}

/// Ollama generate response
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaGenerateResponse {
    /// Generated text
    #[serde(default)]
    pub response: String,

    /// Whether generation is complete
    #[serde(default)]
    pub done: bool,
}
