//! Section Completer: backfills blank sections with placeholder content.
//!
//! Only `summary` is parameterized (by the job-description skills); every other
//! default is static text. Sections with content are never touched.

use tracing::debug;

use crate::pipeline::sections::{SectionKey, SectionMap};
use crate::pipeline::skills::{SkillSet, DEFAULT_SKILLS};

/// How many job skills the summary template names.
pub const SUMMARY_SKILL_LIMIT: usize = 5;
/// How many entries of the default skill list fill an empty `skills` section.
pub const DEFAULT_SKILL_LIMIT: usize = 8;

/// Placeholder content for each section key.
#[derive(Debug, Clone)]
pub struct SectionTemplates {
    /// Summary sentence; `{skills}` is replaced with the job skills.
    pub summary: String,
    /// Substituted for `{skills}` when the job description names no skills.
    pub summary_fallback: String,
    pub default_skills: Vec<String>,
    pub contact: String,
    pub experience: String,
    pub education: String,
    pub projects: String,
    pub certifications: String,
    pub additional: String,
}

impl Default for SectionTemplates {
    fn default() -> Self {
        Self {
            summary: "Results-driven professional with expertise in {skills}. \
                      Passionate about data and technology to solve real-world problems."
                .to_string(),
            summary_fallback: "your field".to_string(),
            default_skills: DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect(),
            contact: "Full Name | email@example.com | (555) 555-5555 | City, State".to_string(),
            experience: "Job Title | Company | 2020 - Present\n\
                         - Describe your accomplishment with quantifiable metric."
                .to_string(),
            education: "Degree | University | Year\n- Include honors, activities.".to_string(),
            projects: "Project Title | Year\n- Brief description with technologies and impact."
                .to_string(),
            certifications: "Certification Name | Authority | Year".to_string(),
            additional: "Languages: English (Fluent), Hindi (Native)\n\
                         Awards: Achieved Best Student Award"
                .to_string(),
        }
    }
}

impl SectionTemplates {
    /// The synthesized body for `key`.
    pub fn default_for(&self, key: SectionKey, job_skills: &SkillSet) -> String {
        match key {
            SectionKey::Summary => {
                let skills = if job_skills.is_empty() {
                    self.summary_fallback.clone()
                } else {
                    job_skills.top(SUMMARY_SKILL_LIMIT).join(", ")
                };
                self.summary.replace("{skills}", &skills)
            }
            SectionKey::Skills => self
                .default_skills
                .iter()
                .take(DEFAULT_SKILL_LIMIT)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            SectionKey::Contact => self.contact.clone(),
            SectionKey::Experience => self.experience.clone(),
            SectionKey::Education => self.education.clone(),
            SectionKey::Projects => self.projects.clone(),
            SectionKey::Certifications => self.certifications.clone(),
            SectionKey::Additional => self.additional.clone(),
        }
    }
}

/// Replaces every blank section of `sections` with its default.
/// Returns the keys that were filled.
pub fn fill_blank_sections(
    sections: &mut SectionMap,
    templates: &SectionTemplates,
    job_skills: &SkillSet,
) -> Vec<SectionKey> {
    let blank = sections.blank_keys();
    for key in &blank {
        sections.set(*key, templates.default_for(*key, job_skills));
    }
    if !blank.is_empty() {
        debug!(
            "Backfilled {} sections: {:?}",
            blank.len(),
            blank.iter().map(|k| k.as_str()).collect::<Vec<_>>()
        );
    }
    blank
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> SkillSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_every_key_is_non_blank_after_fill() {
        let mut map = SectionMap::default();
        map.set(SectionKey::Projects, "   \n ");
        fill_blank_sections(&mut map, &SectionTemplates::default(), &SkillSet::default());
        for (key, body) in map.iter() {
            assert!(!body.trim().is_empty(), "{} left blank", key.as_str());
        }
    }

    #[test]
    fn test_existing_content_is_untouched() {
        let mut map = SectionMap::default();
        map.set(SectionKey::Skills, "rust, tokio");
        let filled = fill_blank_sections(&mut map, &SectionTemplates::default(), &SkillSet::default());
        assert_eq!(map.skills, "rust, tokio");
        assert!(!filled.contains(&SectionKey::Skills));
        assert_eq!(filled.len(), SectionKey::ALL.len() - 1);
    }

    #[test]
    fn test_summary_names_first_five_job_skills() {
        let templates = SectionTemplates::default();
        let job = skills(&["aws", "docker", "git", "nlp", "python", "sql"]);
        let summary = templates.default_for(SectionKey::Summary, &job);
        assert_eq!(
            summary,
            "Results-driven professional with expertise in aws, docker, git, nlp, python. \
             Passionate about data and technology to solve real-world problems."
        );
    }

    #[test]
    fn test_summary_without_job_skills_uses_fallback() {
        let summary = SectionTemplates::default().default_for(SectionKey::Summary, &SkillSet::default());
        assert!(summary.contains("expertise in your field."));
    }

    #[test]
    fn test_skills_default_is_first_eight_of_default_list() {
        let body = SectionTemplates::default().default_for(SectionKey::Skills, &skills(&["excel"]));
        assert_eq!(
            body,
            "python, sql, machine learning, deep learning, data analysis, \
             project management, cloud computing, nlp"
        );
    }

    #[test]
    fn test_static_templates_ignore_job_skills() {
        let templates = SectionTemplates::default();
        let with = templates.default_for(SectionKey::Experience, &skills(&["python"]));
        let without = templates.default_for(SectionKey::Experience, &SkillSet::default());
        assert_eq!(with, without);
        assert!(with.starts_with("Job Title | Company | 2020 - Present\n- "));
    }

    #[test]
    fn test_full_map_reports_nothing_filled() {
        let mut map = SectionMap::default();
        for key in SectionKey::ALL {
            map.set(key, "x");
        }
        let filled = fill_blank_sections(&mut map, &SectionTemplates::default(), &SkillSet::default());
        assert!(filled.is_empty());
    }
}
