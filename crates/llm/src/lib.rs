//! StudyChat model integration
//!
//! Prompt shaping, response cleanup and the model backends behind them

mod backend;
mod catalog;
pub mod cleanup;
mod conversation;
mod huggingface;
mod model_cache;
mod ollama;
mod pipeline;
pub mod prompts;
mod types;

pub use backend::{backend_from_config, ModelBackend};
pub use catalog::{ModelCatalog, ModelFamily, ModelProfile, ParameterPreset};
pub use cleanup::{CleanedResponse, FALLBACK_RESPONSE};
pub use conversation::{ChatReply, ChatSession, ConversationHistory};
pub use huggingface::HuggingFaceClient;
pub use model_cache::{EvictionPolicy, ModelCache};
pub use ollama::{LoadedModel, OllamaBackend};
pub use pipeline::PromptPipeline;
pub use types::{GenerationParams, GenerationRequest, TokenStatus};
