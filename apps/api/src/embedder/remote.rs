//! Remote embedder: calls an OpenAI-compatible `/embeddings` endpoint
//! (a sentence-transformers server, a hosted API, ...).
//!
//! Uses the blocking reqwest client: scoring already runs on a blocking
//! worker thread, never on the async executor.
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedder::{EmbedError, Embedder};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    /// Expected output dimension; 0 skips the check.
    dims: usize,
}

impl RemoteEmbedder {
    /// `base_url` is the API root; `/embeddings` is appended unless already present.
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        dims: usize,
    ) -> Result<Self, EmbedError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: embeddings_endpoint(&base_url),
            model,
            api_key,
            dims,
        })
    }

    /// Posts one embedding request. Retries on 429 and 5xx with exponential
    /// backoff (1s, 2s).
    fn request(&self, text: &str) -> Result<EmbeddingResponse, EmbedError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let mut last_error: Option<EmbedError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                std::thread::sleep(delay);
            }

            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send() {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbedError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, message);
                last_error = Some(EmbedError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(EmbedError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = response.text()?;
            return Ok(serde_json::from_str(&text)?);
        }

        Err(last_error.unwrap_or(EmbedError::Empty))
    }
}

impl Embedder for RemoteEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let response = self.request(text)?;
        let embedding = first_embedding(response, self.dims)?;
        debug!(
            "Embedded {} chars into {} dims via {}",
            text.len(),
            embedding.len(),
            self.model
        );
        Ok(embedding)
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "remote"
    }
}

fn embeddings_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/embeddings") {
        base.to_string()
    } else {
        format!("{base}/embeddings")
    }
}

fn first_embedding(response: EmbeddingResponse, expected: usize) -> Result<Vec<f32>, EmbedError> {
    let embedding = response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .filter(|e| !e.is_empty())
        .ok_or(EmbedError::Empty)?;

    if expected > 0 && embedding.len() != expected {
        return Err(EmbedError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_endpoint_appends_embeddings_path() {
        assert_eq!(
            embeddings_endpoint("http://localhost:8000/v1/"),
            "http://localhost:8000/v1/embeddings"
        );
        assert_eq!(
            embeddings_endpoint("http://localhost:8000/v1/embeddings"),
            "http://localhost:8000/v1/embeddings"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = EmbeddingRequest {
            model: "all-MiniLM-L6-v2",
            input: ["hello"],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "all-MiniLM-L6-v2");
        assert_eq!(json["input"][0], "hello");
    }

    #[test]
    fn test_first_embedding_reads_data_zero() {
        let response = parse(r#"{"data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}], "model": "m"}"#);
        assert_eq!(first_embedding(response, 3).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_first_embedding_checks_dimension() {
        let response = parse(r#"{"data": [{"embedding": [0.1, 0.2]}]}"#);
        assert!(matches!(
            first_embedding(response, 384),
            Err(EmbedError::DimensionMismatch {
                expected: 384,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_first_embedding_without_data_is_empty_error() {
        let response = parse(r#"{"data": []}"#);
        assert!(matches!(first_embedding(response, 0), Err(EmbedError::Empty)));
    }

    #[test]
    fn test_unreachable_service_surfaces_http_error() {
        // Port 9 (discard) is closed on test hosts; connection is refused fast.
        let embedder =
            RemoteEmbedder::new("http://127.0.0.1:9/v1".to_string(), "m".to_string(), None, 0)
                .unwrap();
        let err = embedder.request("hello").err().unwrap();
        assert!(matches!(err, EmbedError::Http(_)), "got {err}");
    }
}
