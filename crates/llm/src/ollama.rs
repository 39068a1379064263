use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use studychat_common::{ChatError, Result};
use tracing::{debug, info, warn};

use crate::backend::ModelBackend;
use crate::model_cache::ModelCache;
use crate::types::{GenerationRequest, OllamaGenerateRequest, OllamaGenerateResponse, OllamaOptions};

/// A model the local runtime has loaded into memory
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// Model name
    pub name: String,

    /// When the load finished
    pub loaded_at: DateTime<Utc>,
}

/// Local Ollama runtime backend
///
/// Each model is loaded once through the injected cache before its first
/// generation request.
pub struct OllamaBackend {
    base_url: String,
    client: Client,
    models: ModelCache<LoadedModel>,
}

impl OllamaBackend {
    /// Create new Ollama backend
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        models: ModelCache<LoadedModel>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama backend initialized: {}", base_url);
        Ok(Self {
            base_url,
            client,
            models,
        })
    }

    pub fn models(&self) -> &ModelCache<LoadedModel> {
        &self.models
    }

    /// Test connection to Ollama
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unreachable_error(e.to_string()))?;
        Ok(response.status().is_success())
    }

    /// Load the model into memory on first use
    pub async fn ensure_loaded(&self, model: &str) -> Result<Arc<LoadedModel>> {
        self.models
            .get_or_load(model, || self.load_model(model))
            .await
    }

    /// An empty prompt makes Ollama load the model without generating
    async fn load_model(&self, model: &str) -> Result<LoadedModel> {
        let request = OllamaGenerateRequest {
            model,
            prompt: "",
            stream: false,
            options: None,
        };
        self.post_generate(model, &request).await?;

        info!("Model loaded in Ollama: {}", model);
        Ok(LoadedModel {
            name: model.to_string(),
            loaded_at: Utc::now(),
        })
    }

    async fn post_generate(
        &self,
        model: &str,
        request: &OllamaGenerateRequest<'_>,
    ) -> Result<OllamaGenerateResponse> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| unreachable_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.ok().filter(|t| !t.trim().is_empty());
            warn!(
                "Ollama API error {} for {}: {}",
                status.as_u16(),
                model,
                details.as_deref().unwrap_or("<no body>")
            );
            return Err(ChatError::from_status(status.as_u16(), model, details));
        }

        response.json().await.map_err(|e| {
            ChatError::unavailable(
                "The local model returned a response that could not be read.",
                Some(e.to_string()),
            )
        })
    }
}

fn unreachable_error(details: String) -> ChatError {
    ChatError::unavailable(
        "Unable to reach the local model runtime. Is Ollama running?",
        Some(details),
    )
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.ensure_loaded(request.model_id()).await?;

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model_id(),
            request.input().len()
        );

        let body = OllamaGenerateRequest {
            model: request.model_id(),
            prompt: request.input(),
            stream: false,
            options: Some(OllamaOptions::from(request.params())),
        };

        let result = self.post_generate(request.model_id(), &body).await?;
        debug!(
            "Received response from Ollama - Length: {}, Done: {}",
            result.response.len(),
            result.done
        );
        Ok(result.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
