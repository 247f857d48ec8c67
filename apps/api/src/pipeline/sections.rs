//! Canonical résumé sections: the closed key set and section record, plus the
//! header synonym table used to locate each section in raw text.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One of the fixed résumé categories. Declaration order is the enumeration
/// order used by segmentation and by `SectionMap::iter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Contact,
    Summary,
    Skills,
    Experience,
    Education,
    Projects,
    Certifications,
    Additional,
}

impl SectionKey {
    pub const ALL: [SectionKey; 8] = [
        SectionKey::Contact,
        SectionKey::Summary,
        SectionKey::Skills,
        SectionKey::Experience,
        SectionKey::Education,
        SectionKey::Projects,
        SectionKey::Certifications,
        SectionKey::Additional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Contact => "contact",
            SectionKey::Summary => "summary",
            SectionKey::Skills => "skills",
            SectionKey::Experience => "experience",
            SectionKey::Education => "education",
            SectionKey::Projects => "projects",
            SectionKey::Certifications => "certifications",
            SectionKey::Additional => "additional",
        }
    }
}

/// Section bodies keyed by `SectionKey`. Every key always has a value,
/// possibly the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionMap {
    pub contact: String,
    pub summary: String,
    pub skills: String,
    pub experience: String,
    pub education: String,
    pub projects: String,
    pub certifications: String,
    pub additional: String,
}

impl SectionMap {
    pub fn get(&self, key: SectionKey) -> &str {
        match key {
            SectionKey::Contact => &self.contact,
            SectionKey::Summary => &self.summary,
            SectionKey::Skills => &self.skills,
            SectionKey::Experience => &self.experience,
            SectionKey::Education => &self.education,
            SectionKey::Projects => &self.projects,
            SectionKey::Certifications => &self.certifications,
            SectionKey::Additional => &self.additional,
        }
    }

    pub fn get_mut(&mut self, key: SectionKey) -> &mut String {
        match key {
            SectionKey::Contact => &mut self.contact,
            SectionKey::Summary => &mut self.summary,
            SectionKey::Skills => &mut self.skills,
            SectionKey::Experience => &mut self.experience,
            SectionKey::Education => &mut self.education,
            SectionKey::Projects => &mut self.projects,
            SectionKey::Certifications => &mut self.certifications,
            SectionKey::Additional => &mut self.additional,
        }
    }

    pub fn set(&mut self, key: SectionKey, value: impl Into<String>) {
        *self.get_mut(key) = value.into();
    }

    /// Iterates `(key, body)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &str)> + '_ {
        SectionKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    /// Keys whose body is empty or whitespace-only.
    pub fn blank_keys(&self) -> Vec<SectionKey> {
        self.iter()
            .filter(|(_, body)| body.trim().is_empty())
            .map(|(key, _)| key)
            .collect()
    }

    /// The assembled résumé text fed to the similarity scorer: non-empty
    /// bodies in key order, separated by a single space.
    pub fn combined_text(&self) -> String {
        self.iter()
            .map(|(_, body)| body)
            .filter(|body| !body.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Overwrites only the keys present in `edits`. Keys absent from the edit
    /// set keep their current body.
    pub fn apply_edits(&mut self, edits: &HashMap<SectionKey, String>) {
        for (key, value) in edits {
            self.set(*key, value.clone());
        }
    }
}

/// Header synonyms per section key, tried in order during segmentation.
/// Synonyms are stored lower-case.
#[derive(Debug, Clone)]
pub struct SectionKeywordTable {
    entries: Vec<(SectionKey, Vec<String>)>,
}

impl SectionKeywordTable {
    /// Builds a table from explicit `(key, synonyms)` pairs. Entries are kept
    /// in enumeration order regardless of input order; a key given twice keeps
    /// its first synonym list.
    pub fn new(entries: Vec<(SectionKey, Vec<String>)>) -> Self {
        let mut entries: Vec<(SectionKey, Vec<String>)> = entries
            .into_iter()
            .map(|(key, synonyms)| {
                (
                    key,
                    synonyms.into_iter().map(|s| s.to_lowercase()).collect(),
                )
            })
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries.dedup_by_key(|(key, _)| *key);
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &[String])> + '_ {
        self.entries
            .iter()
            .map(|(key, synonyms)| (*key, synonyms.as_slice()))
    }
}

impl Default for SectionKeywordTable {
    fn default() -> Self {
        let table: [(SectionKey, &[&str]); 8] = [
            (
                SectionKey::Contact,
                &["contact", "contact information", "phone", "email"],
            ),
            (SectionKey::Summary, &["summary", "objective", "profile"]),
            (SectionKey::Skills, &["skills", "technical skills"]),
            (
                SectionKey::Experience,
                &["experience", "work experience", "employment"],
            ),
            (SectionKey::Education, &["education", "academic"]),
            (SectionKey::Projects, &["projects", "research"]),
            (SectionKey::Certifications, &["certifications", "licenses"]),
            (SectionKey::Additional, &["additional", "languages", "awards"]),
        ];
        Self::new(
            table
                .into_iter()
                .map(|(key, synonyms)| (key, synonyms.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl SectionKeywordTable {
        fn synonyms(&self, key: SectionKey) -> &[String] {
            self.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, synonyms)| synonyms)
                .unwrap_or(&[])
        }
    }

    #[test]
    fn test_default_map_has_every_key_empty() {
        let map = SectionMap::default();
        assert_eq!(map.iter().count(), SectionKey::ALL.len());
        assert!(map.iter().all(|(_, body)| body.is_empty()));
        assert_eq!(map.blank_keys(), SectionKey::ALL.to_vec());
    }

    #[test]
    fn test_set_and_get_round_through_named_fields() {
        let mut map = SectionMap::default();
        map.set(SectionKey::Education, "BS CS");
        assert_eq!(map.education, "BS CS");
        assert_eq!(map.get(SectionKey::Education), "BS CS");
    }

    #[test]
    fn test_combined_text_skips_empty_bodies() {
        let mut map = SectionMap::default();
        map.set(SectionKey::Summary, "Engineer.");
        map.set(SectionKey::Skills, "python");
        assert_eq!(map.combined_text(), "Engineer. python");
    }

    #[test]
    fn test_apply_edits_only_touches_given_keys() {
        let mut map = SectionMap::default();
        map.set(SectionKey::Summary, "old summary");
        map.set(SectionKey::Skills, "sql");
        let edits = HashMap::from([(SectionKey::Summary, "new summary".to_string())]);
        map.apply_edits(&edits);
        assert_eq!(map.summary, "new summary");
        assert_eq!(map.skills, "sql");
    }

    #[test]
    fn test_section_map_json_uses_snake_case_keys() {
        let mut map = SectionMap::default();
        map.set(SectionKey::Certifications, "AWS SA");
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["certifications"], "AWS SA");
        assert_eq!(json["contact"], "");
    }

    #[test]
    fn test_section_map_deserializes_missing_keys_as_empty() {
        let map: SectionMap = serde_json::from_str(r#"{"skills": "git"}"#).unwrap();
        assert_eq!(map.skills, "git");
        assert!(map.summary.is_empty());
    }

    #[test]
    fn test_keyword_table_orders_entries_and_lowercases() {
        let table = SectionKeywordTable::new(vec![
            (SectionKey::Skills, vec!["Skills".to_string()]),
            (SectionKey::Contact, vec!["Email".to_string()]),
        ]);
        let keys: Vec<_> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![SectionKey::Contact, SectionKey::Skills]);
        assert_eq!(table.synonyms(SectionKey::Contact), ["email".to_string()]);
        assert!(table.synonyms(SectionKey::Projects).is_empty());
    }

    #[test]
    fn test_default_table_covers_every_key() {
        let table = SectionKeywordTable::default();
        for key in SectionKey::ALL {
            assert!(!table.synonyms(key).is_empty(), "{} has no synonyms", key.as_str());
        }
        assert_eq!(table.synonyms(SectionKey::Summary)[0], "summary");
    }
}
