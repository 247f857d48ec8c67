//! Skill Extractor: whole-word, case-insensitive matching of a curated skill
//! vocabulary against free text.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Canonical skills recognised by default. Order is significant: the section
/// completer draws its default skill list from the head of this list.
pub const DEFAULT_SKILLS: &[&str] = &[
    "python",
    "sql",
    "machine learning",
    "deep learning",
    "data analysis",
    "project management",
    "cloud computing",
    "nlp",
    "docker",
    "git",
    "tensorflow",
    "keras",
    "aws",
    "azure",
    "react",
    "node.js",
    "excel",
];

/// Ordered list of lower-case skill strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    skills: Vec<String>,
}

impl SkillVocabulary {
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let skills = skills
            .into_iter()
            .map(|s| s.into().trim().to_lowercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        Self { skills }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_SKILLS.iter().copied())
    }
}

/// Sorted, deduplicated subset of a `SkillVocabulary`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `n` skills in sorted order.
    pub fn top(&self, n: usize) -> Vec<&str> {
        self.iter().take(n).collect()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<String> for SkillSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Vocabulary matchers compiled once.
#[derive(Debug, Clone)]
pub struct SkillExtractor {
    matchers: Vec<(String, Regex)>,
}

impl SkillExtractor {
    pub fn new(vocabulary: &SkillVocabulary) -> Self {
        let matchers = vocabulary
            .as_slice()
            .iter()
            .filter_map(|skill| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(skill));
                match Regex::new(&pattern) {
                    Ok(re) => Some((skill.clone(), re)),
                    Err(e) => {
                        warn!("Skipping skill '{skill}': {e}");
                        None
                    }
                }
            })
            .collect();
        Self { matchers }
    }

    /// Returns every vocabulary entry that occurs in `text` as a whole word
    /// or exact phrase.
    pub fn extract(&self, text: &str) -> SkillSet {
        if text.trim().is_empty() {
            return SkillSet::default();
        }
        self.matchers
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(skill, _)| skill.clone())
            .collect()
    }
}
