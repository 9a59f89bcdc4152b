//! Pre-generation input validation.

use charla_types::error::ErrorCategory;

/// Inputs shorter than this (after trimming) are rejected as unclear.
pub const MIN_INPUT_CHARS: usize = 2;

/// Small disallowed lexicons. Whole-word, case-insensitive matching;
/// these gate obviously unusable input, they are not a moderation
/// system.
const PROFANITY: &[&str] = &["fuck", "shit", "bitch", "asshole", "mierda", "joder", "cabron"];

const OFF_TOPIC: &[&str] = &[
    "bitcoin",
    "crypto",
    "gambling",
    "casino",
    "stock tips",
    "lottery",
];

/// Outcome of validating one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputVerdict {
    Valid,
    Rejected(ErrorCategory),
}

impl InputVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, InputVerdict::Valid)
    }
}

/// Validate a user message before it reaches the generator.
///
/// Order matters: length first, then profanity, then off-topic, so an
/// empty message is always `UnclearInput` regardless of lexicons.
pub fn validate_input(text: &str) -> InputVerdict {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_INPUT_CHARS {
        return InputVerdict::Rejected(ErrorCategory::UnclearInput);
    }

    let lowered = trimmed.to_lowercase();
    if contains_term(&lowered, PROFANITY) {
        return InputVerdict::Rejected(ErrorCategory::InappropriateContent);
    }
    if contains_term(&lowered, OFF_TOPIC) {
        return InputVerdict::Rejected(ErrorCategory::OffTopic);
    }

    InputVerdict::Valid
}

fn contains_term(lowered: &str, lexicon: &[&str]) -> bool {
    lexicon.iter().any(|term| {
        if term.contains(' ') {
            return lowered.contains(term);
        }
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *term)
    })
}
