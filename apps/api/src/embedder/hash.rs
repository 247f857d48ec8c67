//! Feature-hashing embedder. No model files, fully deterministic.
//!
//! Each lower-cased token and adjacent-token bigram is hashed (FNV-1a) into a
//! handful of signed buckets; the result is L2-normalised.

use crate::embedder::{EmbedError, Embedder};

pub const DEFAULT_DIMS: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
/// Buckets each feature is spread over.
const PROBES: u64 = 4;
const UNIGRAM_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn embed_tokens(&self, tokens: &[String]) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dims];
        if self.dims == 0 || tokens.is_empty() {
            return embedding;
        }

        for token in tokens {
            accumulate(&mut embedding, token, UNIGRAM_WEIGHT);
        }
        for pair in tokens.windows(2) {
            accumulate(&mut embedding, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_tokens(&tokenize(text)))
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "hash"
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|token| token.trim_matches('.'))
        .filter(|token| token.chars().count() >= 2)
        .map(String::from)
        .collect()
}

fn accumulate(embedding: &mut [f32], feature: &str, weight: f32) {
    let base = fnv1a(feature.as_bytes());
    for probe in 0..PROBES {
        let h = mix(base ^ probe.wrapping_mul(FNV_PRIME));
        let bucket = ((h >> 1) % embedding.len() as u64) as usize;
        if h & 1 == 0 {
            embedding[bucket] += weight;
        } else {
            embedding[bucket] -= weight;
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// splitmix64 finaliser; decorrelates the probes derived from one FNV hash.
fn mix(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::cosine_similarity;

    #[test]
    fn test_embedding_has_configured_dims_and_unit_norm() {
        let v = HashEmbedder::new(128).embed("Rust systems engineer").unwrap();
        assert_eq!(v.len(), 128);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let e = HashEmbedder::default();
        assert_eq!(e.embed("python and sql").unwrap(), e.embed("python and sql").unwrap());
    }

    #[test]
    fn test_case_is_ignored() {
        let e = HashEmbedder::default();
        assert_eq!(e.embed("Docker GIT").unwrap(), e.embed("docker git").unwrap());
    }

    #[test]
    fn test_related_texts_score_higher_than_unrelated() {
        let e = HashEmbedder::default();
        let resume = e.embed("python developer with sql and docker experience").unwrap();
        let close = e.embed("hiring a python developer who knows sql").unwrap();
        let far = e.embed("pastry chef for a french bakery").unwrap();
        let near_sim = cosine_similarity(&resume, &close).unwrap();
        let far_sim = cosine_similarity(&resume, &far).unwrap();
        assert!(near_sim > far_sim, "near {near_sim} far {far_sim}");
    }

    #[test]
    fn test_text_without_tokens_is_zero_vector() {
        let v = HashEmbedder::new(16).embed("a ! ?").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_tokenize_keeps_dotted_and_symbol_skills() {
        assert_eq!(tokenize("Node.js, C++ and C#."), vec!["node.js", "c++", "and", "c#"]);
    }
}
