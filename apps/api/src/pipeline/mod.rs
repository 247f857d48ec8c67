// Résumé pipeline: extract → segment → complete, plus independent scoring.
// Every operation here is blocking; HTTP handlers run them inside
// tokio::task::spawn_blocking.

pub mod completer;
pub mod extractor;
pub mod handlers;
pub mod scoring;
pub mod sections;
pub mod segmenter;
pub mod skills;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::embedder::Embedder;

pub use completer::SectionTemplates;
pub use extractor::{Document, DocumentFormat, TextExtractor};
pub use scoring::SimilarityScore;
pub use sections::{SectionKey, SectionKeywordTable, SectionMap};
pub use skills::{SkillSet, SkillVocabulary};

use completer::fill_blank_sections;
use segmenter::Segmenter;
use skills::SkillExtractor;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot extract text from resume '{0}'")]
    ExtractionFailed(String),
}

/// Visual template the rendering collaborator should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateChoice {
    #[default]
    Simple,
    Modern,
}

impl TemplateChoice {
    /// Unknown or missing identifiers fall back to `Simple`.
    pub fn parse(id: Option<&str>) -> Self {
        match id.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("modern") => TemplateChoice::Modern,
            _ => TemplateChoice::Simple,
        }
    }
}

/// Read-only tables the pipeline is built from.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub keywords: SectionKeywordTable,
    pub vocabulary: SkillVocabulary,
    pub templates: SectionTemplates,
    /// Decompression cap for the DOCX document part.
    pub max_docx_xml_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keywords: SectionKeywordTable::default(),
            vocabulary: SkillVocabulary::default(),
            templates: SectionTemplates::default(),
            max_docx_xml_bytes: extractor::DEFAULT_MAX_DOCX_XML_BYTES,
        }
    }
}

/// Output of `Pipeline::process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedResume {
    /// Raw extracted text, before segmentation.
    pub text: String,
    pub sections: SectionMap,
    pub job_skills: SkillSet,
    /// Keys that were blank after segmentation and received defaults.
    pub backfilled: Vec<SectionKey>,
}

/// The résumé pipeline, built once at startup and shared read-only.
pub struct Pipeline {
    extractor: TextExtractor,
    segmenter: Segmenter,
    skills: SkillExtractor,
    templates: SectionTemplates,
    embedder: Arc<dyn Embedder>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, embedder: Arc<dyn Embedder>) -> Self {
        info!(
            "Pipeline ready: {} skills, embedder={} ({} dims)",
            config.vocabulary.len(),
            embedder.name(),
            embedder.dims()
        );
        Self {
            extractor: TextExtractor::new(config.max_docx_xml_bytes),
            segmenter: Segmenter::new(&config.keywords),
            skills: SkillExtractor::new(&config.vocabulary),
            templates: config.templates,
            embedder,
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn extract(&self, document: &Document) -> String {
        self.extractor.extract(document)
    }

    /// Extracts a file already on disk, e.g. a stored upload.
    pub fn extract_path(&self, path: &Path) -> String {
        self.extractor.extract_path(path)
    }

    pub fn segment(&self, text: &str) -> SectionMap {
        self.segmenter.segment(text)
    }

    pub fn extract_skills(&self, text: &str) -> SkillSet {
        self.skills.extract(text)
    }

    /// Backfills blank sections, returning the completed map and the skills
    /// found in the job description.
    pub fn complete(&self, sections: SectionMap, job_description: &str) -> (SectionMap, SkillSet) {
        let (sections, job_skills, _) = self.complete_tracked(sections, job_description);
        (sections, job_skills)
    }

    fn complete_tracked(
        &self,
        mut sections: SectionMap,
        job_description: &str,
    ) -> (SectionMap, SkillSet, Vec<SectionKey>) {
        let job_skills = self.extract_skills(job_description);
        let filled = fill_blank_sections(&mut sections, &self.templates, &job_skills);
        (sections, job_skills, filled)
    }

    pub fn score(&self, resume_text: &str, job_description: &str) -> Option<SimilarityScore> {
        scoring::score(self.embedder.as_ref(), resume_text, job_description)
    }

    /// Scores a section map against a job description using the assembled
    /// résumé text.
    pub fn score_sections(&self, sections: &SectionMap, job_description: &str) -> Option<SimilarityScore> {
        self.score(&sections.combined_text(), job_description)
    }

    /// extract → segment → complete. Fails only when no text can be extracted.
    pub fn process(
        &self,
        document: &Document,
        job_description: &str,
    ) -> Result<ProcessedResume, PipelineError> {
        let text = self.extract(document);
        if text.trim().is_empty() {
            return Err(PipelineError::ExtractionFailed(document.filename.clone()));
        }

        let sections = self.segment(&text);
        let (sections, job_skills, backfilled) = self.complete_tracked(sections, job_description);
        info!(
            "Processed '{}': {} chars, {} job skills, {} sections backfilled",
            document.filename,
            text.len(),
            job_skills.len(),
            backfilled.len()
        );

        Ok(ProcessedResume {
            text,
            sections,
            job_skills,
            backfilled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;

    const RESUME: &str =
        "Summary\nExperienced engineer.\nSkills\npython, docker\nEducation\nBS CS | State University | 2019";

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default(), Arc::new(HashEmbedder::default()))
    }

    #[test]
    fn test_end_to_end_plain_text_scenario() {
        let p = pipeline();
        let doc = Document::new("resume.txt", RESUME.as_bytes().to_vec());
        let text = p.extract(&doc);
        let sections = p.segment(&text);

        assert_eq!(sections.summary, "Experienced engineer.");
        assert_eq!(sections.skills, "python, docker");
        assert_eq!(sections.education, "BS CS | State University | 2019");
        for key in [
            SectionKey::Contact,
            SectionKey::Experience,
            SectionKey::Projects,
            SectionKey::Certifications,
            SectionKey::Additional,
        ] {
            assert!(sections.get(key).is_empty(), "{} should be empty", key.as_str());
        }
        assert_eq!(p.extract_skills(&sections.skills).to_vec(), vec!["docker", "python"]);
    }

    #[test]
    fn test_crlf_plain_text_is_segmented() {
        let p = pipeline();
        let crlf = RESUME.replace('\n', "\r\n");
        let doc = Document::new("resume.txt", crlf.into_bytes());
        let sections = p.segment(&p.extract(&doc));
        assert_eq!(sections.summary, "Experienced engineer.");
        assert_eq!(sections.skills, "python, docker");
        assert_eq!(sections.education, "BS CS | State University | 2019");
    }

    #[test]
    fn test_extract_path_reads_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0000_resume.txt");
        std::fs::write(&path, RESUME).unwrap();
        assert_eq!(pipeline().segment(&pipeline().extract_path(&path)).skills, "python, docker");
    }

    #[test]
    fn test_process_fills_every_section_and_keeps_existing() {
        let p = pipeline();
        let doc = Document::new("resume.txt", RESUME.as_bytes().to_vec());
        let out = p
            .process(&doc, "We need AWS, Docker and SQL experience")
            .unwrap();

        assert!(out.sections.iter().all(|(_, body)| !body.trim().is_empty()));
        assert_eq!(out.sections.skills, "python, docker");
        assert_eq!(out.job_skills.to_vec(), vec!["aws", "docker", "sql"]);
        assert!(out.backfilled.contains(&SectionKey::Experience));
        assert!(!out.backfilled.contains(&SectionKey::Summary));
    }

    #[test]
    fn test_process_rejects_unextractable_document() {
        let p = pipeline();
        let doc = Document::new("resume.pdf", b"not a pdf".to_vec());
        let err = p.process(&doc, "python").unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(name) if name == "resume.pdf"));
    }

    #[test]
    fn test_complete_returns_job_skills_and_summary_uses_them() {
        let p = pipeline();
        let (sections, job_skills) = p.complete(SectionMap::default(), "Python and Excel wizard");
        assert_eq!(job_skills.to_vec(), vec!["excel", "python"]);
        assert!(sections.summary.contains("expertise in excel, python."));
    }

    #[test]
    fn test_complete_leaves_existing_skills_unchanged() {
        let p = pipeline();
        let mut map = SectionMap::default();
        map.set(SectionKey::Skills, "rust, tokio");
        let (sections, _) = p.complete(map, "");
        assert_eq!(sections.skills, "rust, tokio");
    }

    #[test]
    fn test_score_sections_uses_combined_text() {
        let p = pipeline();
        let mut map = SectionMap::default();
        map.set(SectionKey::Summary, "python developer");
        assert!(p.score_sections(&map, "python developer").is_some());
        assert_eq!(p.score_sections(&SectionMap::default(), "python developer"), None);
        assert_eq!(p.score_sections(&map, "  "), None);
    }

    #[test]
    fn test_template_choice_falls_back_to_simple() {
        assert_eq!(TemplateChoice::parse(Some("Modern")), TemplateChoice::Modern);
        assert_eq!(TemplateChoice::parse(Some("fancy")), TemplateChoice::Simple);
        assert_eq!(TemplateChoice::parse(None), TemplateChoice::Simple);
    }
}
