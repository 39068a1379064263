//! Raw model output normalization
//!
//! Family-specific cleanup runs first, then a shared pass that strips
//! leading punctuation, substitutes a fallback for degenerate output and
//! caps overly long replies at a sentence boundary.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::catalog::ModelFamily;

/// Reply used when cleanup leaves nothing worth showing
pub const FALLBACK_RESPONSE: &str =
    "I'm having trouble generating a good response. Please try again or switch to a different model.";

/// Shortest reply kept as-is, in characters
pub const MIN_RESPONSE_CHARS: usize = 3;

/// Replies longer than this are truncated
pub const MAX_RESPONSE_CHARS: usize = 500;

/// Upper bound for a truncated reply
pub const TRUNCATED_RESPONSE_CHARS: usize = 400;

const ASSISTANT_MARKER: &str = "Assistant:";

static TASK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:question|explain|summarize|solve|answer):\s*").unwrap());

static SPEAKER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:human|assistant):\s*").unwrap());

static LEADING_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\W+").unwrap());

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Final reply text; never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CleanedResponse(String);

impl CleanedResponse {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether cleanup had to fall back to the canned reply
    pub fn is_fallback(&self) -> bool {
        self.0 == FALLBACK_RESPONSE
    }
}

impl fmt::Display for CleanedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CleanedResponse {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean raw model output for display
///
/// # Arguments
/// * `raw` - Text returned by the backend
/// * `family` - Family of the model that produced it
/// * `original_input` - Shaped input that was sent
/// * `original_message` - Sanitized user message
pub fn clean_response(
    raw: &str,
    family: ModelFamily,
    original_input: &str,
    original_message: &str,
) -> CleanedResponse {
    let text = match family {
        ModelFamily::Conversational => clean_conversational(raw, original_input),
        ModelFamily::Instruction => clean_instruction(raw),
        ModelFamily::OpenEnded => clean_open_ended(raw, original_message),
    };

    let cleaned = finalize(&text);
    debug!(
        "Cleaned {:?} response - Raw length: {}, Final length: {}",
        family,
        raw.len(),
        cleaned.len()
    );

    CleanedResponse(cleaned)
}

/// Drop the echoed prompt that DialoGPT-style models repeat back
fn clean_conversational(raw: &str, original_input: &str) -> String {
    if !original_input.is_empty() && raw.contains(original_input) {
        raw.replacen(original_input, "", 1).trim().to_string()
    } else {
        raw.trim().to_string()
    }
}

/// Strip the task marker and collapse repeated sentences
fn clean_instruction(raw: &str) -> String {
    let text = TASK_MARKER.replace(raw.trim(), "");

    let mut seen = HashSet::new();
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(*s))
        .collect();

    let mut joined = sentences.join(". ");
    if !joined.is_empty() && !joined.ends_with('.') {
        joined.push('.');
    }
    joined
}

/// Keep only the final assistant turn of a transcript-style completion
fn clean_open_ended(raw: &str, original_message: &str) -> String {
    let text = match raw.rfind(ASSISTANT_MARKER) {
        Some(idx) => raw[idx + ASSISTANT_MARKER.len()..].trim(),
        None => raw.trim(),
    };

    let text = SPEAKER_MARKER.replace(text, "");
    let text = text.trim();

    match text.strip_prefix(original_message) {
        Some(rest) if !original_message.is_empty() => rest.trim().to_string(),
        _ => text.to_string(),
    }
}

/// Shared pass applied after family cleanup
fn finalize(text: &str) -> String {
    let text = LEADING_NON_WORD.replace(text, "");

    if text.chars().count() < MIN_RESPONSE_CHARS {
        return FALLBACK_RESPONSE.to_string();
    }

    if text.chars().count() <= MAX_RESPONSE_CHARS {
        return text.into_owned();
    }

    let truncated = truncate_to_sentences(&text, TRUNCATED_RESPONSE_CHARS);
    if truncated.chars().count() < MIN_RESPONSE_CHARS {
        FALLBACK_RESPONSE.to_string()
    } else {
        truncated
    }
}

/// Keep whole sentences while the result stays within `limit` characters
///
/// Falls back to a word-boundary cut when the first sentence alone is too long.
fn truncate_to_sentences(text: &str, limit: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    // Length of kept.join(". ") + "."
    let mut length = 0;

    for sentence in SENTENCE_BREAK.split(text).map(str::trim).filter(|s| !s.is_empty()) {
        let separator = if kept.is_empty() { 1 } else { 2 };
        let projected = length + separator + sentence.chars().count();
        if projected > limit {
            break;
        }
        kept.push(sentence);
        length = projected;
    }

    if kept.is_empty() {
        return cut_at_word_boundary(text, limit);
    }

    let mut result = kept.join(". ");
    result.push('.');
    result.trim_end().to_string()
}

fn cut_at_word_boundary(text: &str, limit: usize) -> String {
    let head: String = text.chars().take(limit).collect();
    let cut = match head.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &head[..idx],
        _ => head.as_str(),
    };
    cut.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_dedup_and_marker() {
        let cleaned = clean_response(
            "Question: Paris is the capital. Paris is the capital.",
            ModelFamily::Instruction,
            "Question: What is the capital of France?",
            "What is the capital of France?",
        );
        assert_eq!(cleaned.as_str(), "Paris is the capital.");
    }

    #[test]
    fn test_instruction_marker_case_insensitive() {
        let cleaned = clean_response(
            "ANSWER: Gravity pulls objects together. It keeps planets in orbit",
            ModelFamily::Instruction,
            "Explain: gravity",
            "gravity",
        );
        assert_eq!(
            cleaned.as_str(),
            "Gravity pulls objects together. It keeps planets in orbit."
        );
    }

    #[test]
    fn test_open_ended_last_assistant_turn() {
        let cleaned = clean_response(
            "Human: Hi\nAssistant: Hello there!",
            ModelFamily::OpenEnded,
            "Human: Hi\nAssistant:",
            "Hi",
        );
        assert_eq!(cleaned.as_str(), "Hello there!");

        let cleaned = clean_response(
            "Human: Hi\nAssistant: Hey\nHuman: How are you?\nAssistant: Doing well, thanks.",
            ModelFamily::OpenEnded,
            "Human: Hi\nAssistant:",
            "Hi",
        );
        assert_eq!(cleaned.as_str(), "Doing well, thanks.");
    }

    #[test]
    fn test_open_ended_strips_echoed_message() {
        let cleaned = clean_response(
            "Tell me a story Once upon a time there was a fox.",
            ModelFamily::OpenEnded,
            "Human: Tell me a story\nAssistant:",
            "Tell me a story",
        );
        assert_eq!(cleaned.as_str(), "Once upon a time there was a fox.");
    }

    #[test]
    fn test_conversational_removes_input() {
        let input = "Hello How are you?";
        let raw = format!("{} I'm fine, thanks!", input);
        let cleaned = clean_response(&raw, ModelFamily::Conversational, input, "How are you?");
        assert_eq!(cleaned.as_str(), "I'm fine, thanks!");
    }

    #[test]
    fn test_short_output_falls_back() {
        for raw in ["", "ok", "...", "Human:", "  !! "] {
            let cleaned = clean_response(raw, ModelFamily::OpenEnded, "Human: x\nAssistant:", "x");
            assert!(cleaned.is_fallback(), "expected fallback for {:?}", raw);
        }

        let cleaned = clean_response("Hi", ModelFamily::Conversational, "Hi", "Hi");
        assert_eq!(cleaned.as_str(), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_leading_non_word_stripped() {
        let cleaned = clean_response("--> \"Sure thing", ModelFamily::Conversational, "", "");
        assert_eq!(cleaned.as_str(), "Sure thing");
    }

    #[test]
    fn test_long_output_truncated_to_sentences() {
        let sentence = "This sentence is exactly forty nine chars long ok";
        assert_eq!(sentence.len(), 49);
        let raw = vec![sentence; 12].join(". ");
        assert!(raw.len() > MAX_RESPONSE_CHARS);

        let cleaned = finalize(&raw);
        assert!(cleaned.chars().count() <= TRUNCATED_RESPONSE_CHARS);
        assert!(cleaned.ends_with('.'));
        // 7 sentences of 49 chars plus separators fit in 400, an 8th does not
        assert_eq!(cleaned.matches(sentence).count(), 7);
    }

    #[test]
    fn test_long_output_without_sentence_breaks() {
        let raw = "word ".repeat(150);
        let cleaned = finalize(&raw);
        assert!(cleaned.chars().count() <= TRUNCATED_RESPONSE_CHARS);
        assert!(cleaned.ends_with("word"));
    }

    #[test]
    fn test_deterministic() {
        let raw = "Human: What is 2+2?\nAssistant: 4 is the answer. 4 is the answer.";
        let a = clean_response(raw, ModelFamily::OpenEnded, "Human: What is 2+2?\nAssistant:", "What is 2+2?");
        let b = clean_response(raw, ModelFamily::OpenEnded, "Human: What is 2+2?\nAssistant:", "What is 2+2?");
        assert_eq!(a, b);
    }
}
