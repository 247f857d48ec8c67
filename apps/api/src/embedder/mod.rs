//! Embedding capability: turns text into fixed-length vectors for semantic
//! comparison.
//!
//! The backend is chosen once at startup from `EmbeddingConfig` and shared as
//! `Arc<dyn Embedder>`. Backends must be deterministic for identical input.

pub mod hash;
pub mod remote;

use std::sync::Arc;

use thiserror::Error;

use crate::config::EmbeddingConfig;

pub use hash::HashEmbedder;
pub use remote::RemoteEmbedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding service returned no vectors")]
    Empty,

    #[error("Invalid embedding configuration: {0}")]
    Config(String),
}

/// Pluggable embedding backend.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Output dimension, or 0 when the backend does not know it up front.
    fn dims(&self) -> usize;

    /// Short backend label for logs.
    fn name(&self) -> &str;
}

/// Builds the configured backend.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbedError> {
    let backend = config.backend.trim().to_lowercase();
    match backend.as_str() {
        "" | "hash" => {
            if config.dims == 0 {
                return Err(EmbedError::Config(
                    "EMBEDDING_DIMS must be greater than 0".to_string(),
                ));
            }
            Ok(Arc::new(HashEmbedder::new(config.dims)))
        }
        "remote" => {
            let url = config.url.clone().ok_or_else(|| {
                EmbedError::Config("EMBEDDING_URL is required for the remote backend".to_string())
            })?;
            Ok(Arc::new(RemoteEmbedder::new(
                url,
                config.model.clone(),
                config.api_key.clone(),
                config.dims,
            )?))
        }
        other => Err(EmbedError::Config(format!(
            "unknown embedding backend: {other}"
        ))),
    }
}

/// Cosine similarity of two vectors. Mismatched lengths are an error; a
/// zero-norm vector gives 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbedError> {
    if a.len() != b.len() {
        return Err(EmbedError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot / (norm_a * norm_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str, dims: usize, url: Option<&str>) -> EmbeddingConfig {
        EmbeddingConfig {
            backend: backend.to_string(),
            dims,
            url: url.map(String::from),
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
        }
    }

    #[test]
    fn test_cosine_of_identical_vectors_is_one() {
        let v = [0.3_f32, -0.2, 0.9];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6, "sim was {sim}");
    }

    #[test]
    fn test_cosine_of_opposite_vectors_is_negative_one() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_rejects_length_mismatch() {
        let err = cosine_similarity(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_build_hash_backend_by_default() {
        let embedder = build_embedder(&config("", 64, None)).unwrap();
        assert_eq!(embedder.name(), "hash");
        assert_eq!(embedder.dims(), 64);
    }

    #[test]
    fn test_build_rejects_zero_dims() {
        assert!(matches!(
            build_embedder(&config("hash", 0, None)),
            Err(EmbedError::Config(_))
        ));
    }

    #[test]
    fn test_build_remote_requires_url() {
        assert!(matches!(
            build_embedder(&config("remote", 384, None)),
            Err(EmbedError::Config(_))
        ));
    }

    #[test]
    fn test_build_remote_with_url() {
        let embedder = build_embedder(&config("Remote", 384, Some("http://localhost:9/v1"))).unwrap();
        assert_eq!(embedder.name(), "remote");
    }

    #[test]
    fn test_build_rejects_unknown_backend() {
        let err = build_embedder(&config("onnx", 384, None)).err().unwrap();
        assert!(err.to_string().contains("onnx"));
    }
}
