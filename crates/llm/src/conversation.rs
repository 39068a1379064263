use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use studychat_common::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::ModelBackend;
use crate::catalog::ModelProfile;
use crate::pipeline::PromptPipeline;

/// Recent exchange strings kept for prompting
///
/// Entries alternate user message / model reply, most recent last.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: Vec<String>,
    window: usize,
}

impl ConversationHistory {
    /// Create empty history keeping at most `window` entries
    pub fn new(window: usize) -> Self {
        Self {
            entries: Vec::new(),
            window: window.max(1),
        }
    }

    /// Append a completed exchange and drop entries outside the window
    pub fn push_exchange(&mut self, message: impl Into<String>, reply: impl Into<String>) {
        self.entries.push(message.into());
        self.entries.push(reply.into());

        if self.entries.len() > self.window {
            let excess = self.entries.len() - self.window;
            self.entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Reply ready for display
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    /// Unique identifier
    pub id: Uuid,

    /// Cleaned reply text
    pub content: String,

    /// Model that produced it
    pub model_id: String,

    /// When the reply was received
    pub timestamp: DateTime<Utc>,
}

/// One conversation with one active model
///
/// `send` takes `&mut self`, so a session never has two requests in flight.
pub struct ChatSession {
    pipeline: PromptPipeline,
    backend: Arc<dyn ModelBackend>,
    model: ModelProfile,
    history: ConversationHistory,
}

impl ChatSession {
    /// Start a session on a catalog model
    pub fn new(
        pipeline: PromptPipeline,
        backend: Arc<dyn ModelBackend>,
        model_id: &str,
        history_window: usize,
    ) -> Result<Self> {
        let model = pipeline.catalog().resolve(model_id)?.clone();

        Ok(Self {
            pipeline,
            backend,
            model,
            history: ConversationHistory::new(history_window),
        })
    }

    pub fn model(&self) -> &ModelProfile {
        &self.model
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn pipeline(&self) -> &PromptPipeline {
        &self.pipeline
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Change the active model; history is cleared on success
    pub fn switch_model(&mut self, model_id: &str) -> Result<&ModelProfile> {
        let model = self.pipeline.catalog().resolve(model_id)?.clone();

        info!("Switching model: {} -> {}", self.model.id, model.id);
        self.model = model;
        self.history.clear();
        Ok(&self.model)
    }

    /// Send one message and return the cleaned reply
    ///
    /// History is only extended when the backend call succeeds.
    pub async fn send(&mut self, message: &str) -> Result<ChatReply> {
        let request = self
            .pipeline
            .build_request(message, &self.model.id, self.history.entries())?;

        info!(
            "Sending message - Model: {}, Backend: {}",
            self.model.id,
            self.backend.name()
        );

        let raw = match self.backend.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Generation failed for {}: {} (details: {})",
                    self.model.id,
                    e,
                    e.details().as_deref().unwrap_or("none")
                );
                return Err(e);
            }
        };

        let cleaned = self.pipeline.clean_response(&raw, &request);
        if cleaned.is_fallback() {
            warn!("Cleanup produced no usable text for {}", self.model.id);
        }

        self.history
            .push_exchange(request.message(), cleaned.as_str());

        Ok(ChatReply {
            id: Uuid::new_v4(),
            content: cleaned.into_string(),
            model_id: self.model.id.clone(),
            timestamp: Utc::now(),
        })
    }
}
