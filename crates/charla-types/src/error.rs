//! Error types shared across the workspace.

use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Classified failure category for the recovery engine and monitor.
///
/// `UnclearInput`, `InappropriateContent`, and `OffTopic` are produced
/// by pre-generation validation; the rest by post-generation
/// classification. `Unknown` is the taxonomy default for turns that
/// never went through classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    UnclearInput,
    InappropriateContent,
    OffTopic,
    ConnectivityIssue,
    GenerationFailure,
    LanguageDetectionFailure,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::UnclearInput => write!(f, "unclear_input"),
            ErrorCategory::InappropriateContent => write!(f, "inappropriate_content"),
            ErrorCategory::OffTopic => write!(f, "off_topic"),
            ErrorCategory::ConnectivityIssue => write!(f, "connectivity_issue"),
            ErrorCategory::GenerationFailure => write!(f, "generation_failure"),
            ErrorCategory::LanguageDetectionFailure => write!(f, "language_detection_failure"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unclear_input" => Ok(ErrorCategory::UnclearInput),
            "inappropriate_content" => Ok(ErrorCategory::InappropriateContent),
            "off_topic" => Ok(ErrorCategory::OffTopic),
            "connectivity_issue" => Ok(ErrorCategory::ConnectivityIssue),
            "generation_failure" => Ok(ErrorCategory::GenerationFailure),
            "language_detection_failure" => Ok(ErrorCategory::LanguageDetectionFailure),
            "unknown" => Ok(ErrorCategory::Unknown),
            other => Err(format!("invalid error category: '{other}'")),
        }
    }
}

/// Errors from repository operations (trait definitions live in charla-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from session registry operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid language mode: '{0}'")]
    InvalidMode(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_roundtrip() {
        for category in [
            ErrorCategory::UnclearInput,
            ErrorCategory::InappropriateContent,
            ErrorCategory::OffTopic,
            ErrorCategory::ConnectivityIssue,
            ErrorCategory::GenerationFailure,
            ErrorCategory::LanguageDetectionFailure,
            ErrorCategory::Unknown,
        ] {
            let s = category.to_string();
            let parsed: ErrorCategory = s.parse().unwrap();
            assert_eq!(category, parsed);
        }
    }

    #[test]
    fn test_error_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::ConnectivityIssue).unwrap();
        assert_eq!(json, "\"connectivity_issue\"");
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::InvalidMode("klingon".to_string());
        assert_eq!(err.to_string(), "invalid language mode: 'klingon'");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_session_error_from_repository() {
        let err: SessionError = RepositoryError::NotFound.into();
        assert!(matches!(err, SessionError::Repository(_)));
    }
}
