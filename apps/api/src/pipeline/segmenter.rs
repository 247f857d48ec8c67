//! Section Segmenter: partitions extracted résumé text into `SectionMap`
//! using header-synonym detection.
//!
//! A header counts only when it starts the text or a line and is immediately
//! followed by a line break, colon, or hyphen. `\r\n` and lone `\r` count as
//! line breaks. Each key contributes at most one
//! candidate offset: the first synonym (in table order) that matches anywhere.

use regex::Regex;
use tracing::{debug, warn};

use crate::pipeline::sections::{SectionKey, SectionKeywordTable, SectionMap};

/// Characters stripped from both ends of a section body once its header line
/// is removed.
const BODY_TRIM: &[char] = &[':', ' ', '\n', '\r', '\t'];

/// Header matchers compiled once from a `SectionKeywordTable`.
#[derive(Debug, Clone)]
pub struct Segmenter {
    matchers: Vec<(SectionKey, Vec<Regex>)>,
}

impl Segmenter {
    pub fn new(table: &SectionKeywordTable) -> Self {
        let matchers = table
            .iter()
            .map(|(key, synonyms)| {
                let patterns = synonyms
                    .iter()
                    .filter_map(|synonym| header_pattern(synonym))
                    .collect();
                (key, patterns)
            })
            .collect();
        Self { matchers }
    }

    /// Splits `text` into sections. Always returns every key.
    pub fn segment(&self, text: &str) -> SectionMap {
        let mut sections = SectionMap::default();
        let lowered = lowercase_preserving_offsets(text);

        let mut candidates: Vec<(usize, SectionKey)> = self
            .matchers
            .iter()
            .filter_map(|(key, patterns)| {
                patterns
                    .iter()
                    .find_map(|pattern| pattern.find(&lowered))
                    .map(|m| (m.start(), *key))
            })
            .collect();
        candidates.sort();

        if candidates.is_empty() {
            debug!("No section headers detected; assigning full text to summary");
            sections.set(SectionKey::Summary, text.trim());
            return sections;
        }

        for (i, (start, key)) in candidates.iter().enumerate() {
            let end = candidates
                .get(i + 1)
                .map(|(next, _)| *next)
                .unwrap_or(text.len());
            sections.set(*key, section_body(&text[*start..end]));
        }

        debug!(
            "Segmented text into {} sections: {:?}",
            candidates.len(),
            candidates.iter().map(|(_, k)| k.as_str()).collect::<Vec<_>>()
        );
        sections
    }
}

/// Builds the line-start / terminator-bounded matcher for one synonym.
fn header_pattern(synonym: &str) -> Option<Regex> {
    let pattern = format!(r"(?:^|[\r\n]){}[\r\n:\-]", regex::escape(synonym));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping header synonym '{synonym}': {e}");
            None
        }
    }
}

/// Strips the header line and surrounding punctuation from a raw span.
fn section_body(span: &str) -> String {
    let span = span.trim();
    let body = match span.find(['\r', '\n']) {
        Some(line_break) => &span[line_break + 1..],
        None => span,
    };
    body.trim_matches(BODY_TRIM).to_string()
}

/// Lower-cases `text` one character at a time, keeping any character whose
/// lower-case form has a different UTF-8 length, so byte offsets found in the
/// result are valid in the original.
fn lowercase_preserving_offsets(text: &str) -> String {
    text.chars()
        .map(|c| {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) if l.len_utf8() == c.len_utf8() => l,
                _ => c,
            }
        })
        .collect()
}
