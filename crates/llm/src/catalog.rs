//! Static model catalog and family classification

use serde::{Deserialize, Serialize};
use studychat_common::{ChatError, Result};

use crate::types::GenerationParams;

/// Prompt shaping and cleanup family of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Turn-based chat models (DialoGPT)
    Conversational,
    /// Text-to-text instruction models (T5, Flan-T5, BlenderBot)
    Instruction,
    /// Plain causal language models (GPT-2 and anything unrecognized)
    OpenEnded,
}

impl ModelFamily {
    /// Classify a model id by case-insensitive substring match
    pub fn classify(model_id: &str) -> Self {
        let id = model_id.to_lowercase();
        if id.contains("dialogpt") {
            Self::Conversational
        } else if id.contains("blenderbot") || id.contains("t5") || id.contains("flan") {
            Self::Instruction
        } else {
            Self::OpenEnded
        }
    }
}

/// Generation parameter table a model draws from
///
/// BlenderBot shares instruction-style shaping but has its own sampling
/// settings, so presets are finer-grained than families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPreset {
    Conversational,
    BlenderBot,
    Instruction,
    OpenEnded,
}

impl ParameterPreset {
    /// Pick the preset for a model id within its family
    pub fn for_model(model_id: &str, family: ModelFamily) -> Self {
        match family {
            ModelFamily::Conversational => Self::Conversational,
            ModelFamily::Instruction if model_id.to_lowercase().contains("blenderbot") => {
                Self::BlenderBot
            }
            ModelFamily::Instruction => Self::Instruction,
            ModelFamily::OpenEnded => Self::OpenEnded,
        }
    }

    /// Literal parameter values for this preset
    pub fn params(self) -> GenerationParams {
        match self {
            Self::Conversational => GenerationParams {
                max_new_tokens: 100,
                temperature: 0.7,
                top_p: 0.9,
                top_k: None,
                repetition_penalty: Some(1.1),
                eos_token_id: None,
                do_sample: true,
            },
            Self::BlenderBot => GenerationParams {
                max_new_tokens: 60,
                temperature: 0.8,
                top_p: 0.9,
                top_k: None,
                repetition_penalty: None,
                eos_token_id: None,
                do_sample: true,
            },
            Self::Instruction => GenerationParams {
                max_new_tokens: 80,
                temperature: 0.6,
                top_p: 0.9,
                top_k: None,
                repetition_penalty: Some(1.1),
                eos_token_id: None,
                do_sample: true,
            },
            Self::OpenEnded => GenerationParams {
                max_new_tokens: 50,
                temperature: 0.7,
                top_p: 0.9,
                top_k: Some(40),
                repetition_penalty: Some(1.1),
                // GPT-2 <|endoftext|>
                eos_token_id: Some(50256),
                do_sample: true,
            },
        }
    }
}

/// Catalog entry for one selectable model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelProfile {
    /// Model id as the backend knows it (e.g., "microsoft/DialoGPT-medium")
    pub id: String,

    /// Display name
    pub name: String,

    /// Display description
    pub description: String,

    /// Resolved family
    pub family: ModelFamily,

    /// Resolved generation parameters
    #[serde(skip)]
    pub params: GenerationParams,
}

impl ModelProfile {
    /// Build a profile, resolving family and parameters from the id
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let family = ModelFamily::classify(&id);
        let params = ParameterPreset::for_model(&id, family).params();

        Self {
            id,
            name: name.into(),
            description: description.into(),
            family,
            params,
        }
    }
}

/// Fixed set of models available to the chat
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    profiles: Vec<ModelProfile>,
}

impl ModelCatalog {
    /// Create catalog from explicit profiles
    pub fn new(profiles: Vec<ModelProfile>) -> Self {
        Self { profiles }
    }

    /// Built-in model list
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelProfile::new(
                "microsoft/DialoGPT-medium",
                "DialoGPT Medium",
                "Microsoft's conversational AI model",
            ),
            ModelProfile::new(
                "microsoft/DialoGPT-large",
                "DialoGPT Large",
                "Larger version with better responses",
            ),
            ModelProfile::new(
                "facebook/blenderbot-400M-distill",
                "BlenderBot 400M",
                "Facebook's conversational AI model",
            ),
            ModelProfile::new(
                "google/flan-t5-base",
                "Flan-T5 Base",
                "Instruction-tuned model for questions and explanations",
            ),
            ModelProfile::new(
                "Xenova/LaMini-Flan-T5-248M",
                "LaMini Flan-T5",
                "Small instruction model for study questions",
            ),
            ModelProfile::new(
                "gpt2",
                "GPT-2",
                "OpenAI's open-ended text generator",
            ),
            ModelProfile::new(
                "distilgpt2",
                "DistilGPT-2",
                "Faster, lighter GPT-2 for creative writing practice",
            ),
        ])
    }

    /// Look up a profile by exact id
    pub fn get(&self, model_id: &str) -> Option<&ModelProfile> {
        self.profiles.iter().find(|p| p.id == model_id)
    }

    /// Look up a profile, failing for unknown ids
    pub fn resolve(&self, model_id: &str) -> Result<&ModelProfile> {
        self.get(model_id)
            .ok_or_else(|| ChatError::unknown_model(model_id))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ModelFamily::classify("microsoft/DialoGPT-medium"), ModelFamily::Conversational);
        assert_eq!(ModelFamily::classify("facebook/blenderbot-400M-distill"), ModelFamily::Instruction);
        assert_eq!(ModelFamily::classify("google/flan-t5-base"), ModelFamily::Instruction);
        assert_eq!(ModelFamily::classify("t5-small"), ModelFamily::Instruction);
        assert_eq!(ModelFamily::classify("gpt2"), ModelFamily::OpenEnded);
        assert_eq!(ModelFamily::classify("EleutherAI/gpt-neo-125M"), ModelFamily::OpenEnded);
    }

    #[test]
    fn test_parameter_presets() {
        let dialog = ModelProfile::new("microsoft/DialoGPT-large", "", "");
        assert_eq!(dialog.params.max_new_tokens, 100);
        assert_eq!(dialog.params.repetition_penalty, Some(1.1));

        let blender = ModelProfile::new("facebook/blenderbot-400M-distill", "", "");
        assert_eq!(blender.family, ModelFamily::Instruction);
        assert_eq!(blender.params.max_new_tokens, 60);
        assert_eq!(blender.params.temperature, 0.8);
        assert_eq!(blender.params.repetition_penalty, None);

        let flan = ModelProfile::new("google/flan-t5-base", "", "");
        assert_eq!(flan.params.max_new_tokens, 80);
        assert_eq!(flan.params.temperature, 0.6);

        let gpt = ModelProfile::new("distilgpt2", "", "");
        assert_eq!(gpt.params.max_new_tokens, 50);
        assert_eq!(gpt.params.top_k, Some(40));
        assert_eq!(gpt.params.eos_token_id, Some(50256));
    }

    #[test]
    fn test_catalog_resolve() {
        let catalog = ModelCatalog::builtin();
        assert!(catalog.len() >= 5);
        assert!(catalog.resolve("gpt2").is_ok());
        assert!(matches!(
            catalog.resolve("meta-llama/Llama-2-7b"),
            Err(ChatError::UnknownModel(_))
        ));
    }
}
