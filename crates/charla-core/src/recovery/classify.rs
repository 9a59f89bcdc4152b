//! Post-generation failure classification.
//!
//! Generator failures are opaque. Classification substring-matches the
//! rendered error message against small keyword sets; anything
//! unmatched is a plain generation failure.

use charla_types::error::ErrorCategory;
use charla_types::generation::GenerationError;

const CONNECTIVITY_KEYWORDS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "connection",
    "connect",
    "unreachable",
    "dns",
    "reset by peer",
];

const LANGUAGE_KEYWORDS: &[&str] = &["language", "detect", "locale", "translation"];

/// Map an opaque generation failure to a recovery category.
pub fn categorize(error: &GenerationError) -> ErrorCategory {
    let message = error.to_string().to_lowercase();

    if CONNECTIVITY_KEYWORDS.iter().any(|k| message.contains(k)) {
        return ErrorCategory::ConnectivityIssue;
    }
    if LANGUAGE_KEYWORDS.iter().any(|k| message.contains(k)) {
        return ErrorCategory::LanguageDetectionFailure;
    }

    ErrorCategory::GenerationFailure
}
