use anyhow::{Context, Result};

use crate::embedder::hash::DEFAULT_DIMS;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub score_timeout_secs: u64,
    pub embedding: EmbeddingConfig,
}

/// Selects and parameterises the embedding backend.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// "hash" (default) or "remote".
    pub backend: String,
    pub dims: usize,
    pub url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "hash".to_string(),
            dims: DEFAULT_DIMS,
            url: None,
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = EmbeddingConfig::default();
        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            score_timeout_secs: parse_env("SCORE_TIMEOUT_SECS", 30)?,
            embedding: EmbeddingConfig {
                backend: std::env::var("EMBEDDING_BACKEND").unwrap_or(defaults.backend),
                dims: parse_env("EMBEDDING_DIMS", defaults.dims)?,
                url: optional_env("EMBEDDING_URL"),
                model: std::env::var("EMBEDDING_MODEL").unwrap_or(defaults.model),
                api_key: optional_env("EMBEDDING_API_KEY"),
            },
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let port: u16 = parse_env("TAILOR_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_embedding_defaults() {
        let cfg = EmbeddingConfig::default();
        assert_eq!(cfg.backend, "hash");
        assert_eq!(cfg.dims, 384);
        assert!(cfg.url.is_none());
    }
}
