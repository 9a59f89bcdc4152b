//! Configuration models deserialized from `config.toml`.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// How the generation boundary is driven.
///
/// The backend contract supports both direct and streaming operation;
/// whether "streaming" is true incremental generation or is simulated
/// by chunking a complete response is an explicit deployment choice,
/// not an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Consume the backend's incremental SSE fragment stream.
    Incremental,
    /// Call the direct endpoint, then chunk the finished text locally.
    Chunked,
    /// Direct request/response; no fragment relay at all.
    Direct,
}

impl Default for StreamMode {
    fn default() -> Self {
        StreamMode::Incremental
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Incremental => write!(f, "incremental"),
            StreamMode::Chunked => write!(f, "chunked"),
            StreamMode::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incremental" => Ok(StreamMode::Incremental),
            "chunked" => Ok(StreamMode::Chunked),
            "direct" => Ok(StreamMode::Direct),
            other => Err(format!("invalid stream mode: '{other}'")),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation backend.
    pub base_url: String,
    /// Env var holding the backend API key, when the backend requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub stream_mode: StreamMode,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Chunk size (chars) used by `StreamMode::Chunked`.
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_chunk_chars() -> usize {
    48
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9200".to_string(),
            api_key_env: None,
            stream_mode: StreamMode::default(),
            request_timeout_ms: default_request_timeout_ms(),
            chunk_chars: default_chunk_chars(),
        }
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8750".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Top-level configuration loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharlaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_mode_roundtrip() {
        for mode in [StreamMode::Incremental, StreamMode::Chunked, StreamMode::Direct] {
            let s = mode.to_string();
            let parsed: StreamMode = s.parse().unwrap();
            assert_eq!(mode, parsed);
        }
    }

    #[test]
    fn test_generation_config_defaults() {
        let json = r#"{"base_url":"http://gen.internal"}"#;
        let config: GenerationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.stream_mode, StreamMode::Incremental);
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.chunk_chars, 48);
    }

    #[test]
    fn test_charla_config_empty_is_default() {
        let config: CharlaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8750");
        assert_eq!(config.generation.base_url, "http://127.0.0.1:9200");
    }
}
