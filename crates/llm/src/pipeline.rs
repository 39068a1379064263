use std::sync::Arc;
use studychat_common::Result;
use tracing::debug;

use crate::catalog::ModelCatalog;
use crate::cleanup::{self, CleanedResponse};
use crate::prompts::{sanitize_message, shape_input};
use crate::types::GenerationRequest;

/// Model-adaptive prompt construction and response cleanup
///
/// Both operations are pure; the only state is the read-only catalog.
#[derive(Debug, Clone)]
pub struct PromptPipeline {
    catalog: Arc<ModelCatalog>,
}

impl PromptPipeline {
    /// Create new pipeline over a catalog
    pub fn new(catalog: Arc<ModelCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Validate the message and shape it for the selected model
    ///
    /// # Arguments
    /// * `message` - Raw user message
    /// * `model_id` - Catalog id of the target model
    /// * `history` - Prior exchange strings, most recent last
    pub fn build_request(
        &self,
        message: &str,
        model_id: &str,
        history: &[String],
    ) -> Result<GenerationRequest> {
        let message = sanitize_message(message)?;
        let profile = self.catalog.resolve(model_id)?;
        let input = shape_input(profile.family, &message, history);

        debug!(
            "Built request - Model: {}, Family: {:?}, Input length: {}, History entries: {}",
            profile.id,
            profile.family,
            input.len(),
            history.len()
        );

        Ok(GenerationRequest::new(
            profile.id.clone(),
            profile.family,
            input,
            message,
            profile.params.clone(),
        ))
    }

    /// Turn raw backend output into the reply shown to the user
    pub fn clean_response(&self, raw: &str, request: &GenerationRequest) -> CleanedResponse {
        cleanup::clean_response(raw, request.family(), request.input(), request.message())
    }
}

impl Default for PromptPipeline {
    fn default() -> Self {
        Self::new(Arc::new(ModelCatalog::builtin()))
    }
}
