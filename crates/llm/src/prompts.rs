//! Input shaping per model family

use studychat_common::{ChatError, Result};

use crate::catalog::ModelFamily;

/// Maximum message length in characters, after control characters and
/// surrounding whitespace are removed
pub const MAX_MESSAGE_CHARS: usize = 500;

/// History entries folded into a conversational prompt
pub const PROMPT_HISTORY_WINDOW: usize = 6;

/// Remove control characters and surrounding whitespace, then validate length
///
/// Tab, line feed and carriage return are kept.
pub fn sanitize_message(message: &str) -> Result<String> {
    let stripped: String = message.chars().filter(|c| !is_stripped_control(*c)).collect();
    let cleaned = stripped.trim();

    if cleaned.is_empty() {
        return Err(ChatError::invalid_input("Message cannot be empty"));
    }

    let length = cleaned.chars().count();
    if length > MAX_MESSAGE_CHARS {
        return Err(ChatError::invalid_input(format!(
            "Message is too long ({} characters, maximum is {})",
            length, MAX_MESSAGE_CHARS
        )));
    }

    Ok(cleaned.to_string())
}

fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{0008}' | '\u{000B}' | '\u{000C}' | '\u{000E}'..='\u{001F}' | '\u{007F}'
    )
}

/// Last entries of the history that are eligible for a prompt
pub fn recent_history(history: &[String]) -> &[String] {
    &history[history.len().saturating_sub(PROMPT_HISTORY_WINDOW)..]
}

/// Task marker for instruction models, chosen by keyword
///
/// First match wins; `?` is checked before any keyword, so
/// "What is gravity?" is a question, not an explanation.
pub fn instruction_prefix(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if lower.contains('?') {
        "Question: "
    } else if contains_any(&lower, &["explain", "what is", "how does"]) {
        "Explain: "
    } else if contains_any(&lower, &["summarize", "summary"]) {
        "Summarize: "
    } else if contains_any(&lower, &["solve", "calculate"]) {
        "Solve: "
    } else {
        "Question: "
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Build the model input for a sanitized message
pub fn shape_input(family: ModelFamily, message: &str, history: &[String]) -> String {
    match family {
        ModelFamily::Conversational => {
            let recent = recent_history(history);
            if recent.is_empty() {
                message.to_string()
            } else {
                format!("{} {}", recent.join(" "), message)
            }
        }
        ModelFamily::Instruction => format!("{}{}", instruction_prefix(message), message),
        ModelFamily::OpenEnded => format!("Human: {}\nAssistant:", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sanitize_strips_controls_and_trims() {
        assert_eq!(sanitize_message("  hi\u{0007} there\u{007F} ").unwrap(), "hi there");
        assert_eq!(sanitize_message("line one\nline two").unwrap(), "line one\nline two");
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(matches!(sanitize_message(""), Err(ChatError::InvalidInput(_))));
        assert!(matches!(sanitize_message("   \t "), Err(ChatError::InvalidInput(_))));
        assert!(matches!(
            sanitize_message("\u{0001}\u{0002}\u{001B}\u{007F}"),
            Err(ChatError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sanitize_length_limit() {
        let at_limit = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(sanitize_message(&at_limit).is_ok());

        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(sanitize_message(&over), Err(ChatError::InvalidInput(_))));

        // Control characters do not count toward the limit
        let padded = format!("{}{}", "\u{0000}".repeat(20), at_limit);
        assert!(sanitize_message(&padded).is_ok());

        // Length is measured in characters, not bytes
        let wide = "가".repeat(MAX_MESSAGE_CHARS);
        assert!(sanitize_message(&wide).is_ok());
    }

    #[test]
    fn test_sanitize_limit_applies_after_trim() {
        let at_limit = "a".repeat(MAX_MESSAGE_CHARS);

        let spaced = format!("  {}   \n", at_limit);
        assert_eq!(sanitize_message(&spaced).unwrap(), at_limit);

        // Inner whitespace still counts
        let inner = format!("{} {}", "a".repeat(250), "a".repeat(250));
        assert!(matches!(sanitize_message(&inner), Err(ChatError::InvalidInput(_))));
    }

    #[test]
    fn test_instruction_prefix_precedence() {
        assert_eq!(instruction_prefix("What is gravity?"), "Question: ");
        assert_eq!(instruction_prefix("What is gravity"), "Explain: ");
        assert_eq!(instruction_prefix("Please EXPLAIN photosynthesis"), "Explain: ");
        assert_eq!(instruction_prefix("How does a rainbow form"), "Explain: ");
        assert_eq!(instruction_prefix("Give me a summary of WW1"), "Summarize: ");
        assert_eq!(instruction_prefix("Solve 2x + 3 = 7"), "Solve: ");
        assert_eq!(instruction_prefix("calculate the area"), "Solve: ");
        assert_eq!(instruction_prefix("Tell me about Mars"), "Question: ");
    }

    #[test]
    fn test_shape_conversational() {
        assert_eq!(shape_input(ModelFamily::Conversational, "Hello", &[]), "Hello");

        let h = history(&["one", "two", "three", "four", "five", "six", "seven", "eight"]);
        assert_eq!(
            shape_input(ModelFamily::Conversational, "nine", &h),
            "three four five six seven eight nine"
        );
    }

    #[test]
    fn test_shape_instruction_and_open_ended() {
        let h = history(&["ignored"]);
        assert_eq!(
            shape_input(ModelFamily::Instruction, "Summarize the French revolution", &h),
            "Summarize: Summarize the French revolution"
        );
        assert_eq!(
            shape_input(ModelFamily::OpenEnded, "Hi", &h),
            "Human: Hi\nAssistant:"
        );
    }
}
