//! Similarity Scorer: semantic alignment between résumé and job description.
//!
//! score = round(cosine(embed(resume), embed(job)) * 100, 1)
//!
//! The cosine is scaled, not remapped from [-1, 1], so a negative similarity
//! yields a negative score. Embedders that produce non-negative similarities
//! in practice keep the result within [0, 100].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedder::{cosine_similarity, EmbedError, Embedder};

/// Alignment percentage rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
    pub fn from_cosine(cosine: f64) -> Self {
        Self((cosine * 1000.0).round() / 10.0)
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Scores `resume_text` against `job_description`. `None` when either side is
/// blank or the embedder fails; `Some(0.0)` is a real score.
pub fn score(
    embedder: &dyn Embedder,
    resume_text: &str,
    job_description: &str,
) -> Option<SimilarityScore> {
    if resume_text.trim().is_empty() || job_description.trim().is_empty() {
        debug!("Skipping similarity score: blank input");
        return None;
    }

    match cosine(embedder, resume_text, job_description) {
        Ok(cos) => {
            let score = SimilarityScore::from_cosine(cos);
            debug!("Similarity via {}: cosine={cos:.4} score={score}", embedder.name());
            Some(score)
        }
        Err(e) => {
            warn!("Similarity score unavailable ({} embedder): {e}", embedder.name());
            None
        }
    }
}

fn cosine(embedder: &dyn Embedder, a: &str, b: &str) -> Result<f64, EmbedError> {
    let emb_a = embedder.embed(a)?;
    let emb_b = embedder.embed(b)?;
    cosine_similarity(&emb_a, &emb_b)
}
