//! Axum route handlers for the résumé pipeline.
//!
//! Handlers only translate HTTP to pipeline calls and sentinels to messages;
//! all blocking work goes through `spawn_blocking`.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::{
    Document, DocumentFormat, PipelineError, SectionKey, SectionMap, SimilarityScore, SkillSet,
    TemplateChoice,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub document_id: Uuid,
    pub filename: String,
    pub format: DocumentFormat,
    pub sections: SectionMap,
    pub job_skills: SkillSet,
    /// Job skills as one comma-separated line, for keyword display.
    pub job_keywords: String,
    pub backfilled: Vec<SectionKey>,
    pub template_choice: TemplateChoice,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadSectionsResponse {
    pub document_id: Uuid,
    pub sections: SectionMap,
}

#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub skills: SkillSet,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub sections: SectionMap,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub sections: SectionMap,
    pub job_skills: SkillSet,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub sections: SectionMap,
    /// User edits applied on top of `sections` before scoring.
    #[serde(default)]
    pub edits: HashMap<SectionKey, String>,
    #[serde(default)]
    pub job_description: String,
    pub template_choice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    /// `null` when either side is blank or scoring was unavailable.
    pub ats_score: Option<SimilarityScore>,
    pub sections: SectionMap,
    pub template_choice: TemplateChoice,
}

/// Fields collected from the ingest multipart form.
#[derive(Default)]
struct IngestForm {
    file: Option<(String, Bytes)>,
    job_description: String,
    template_choice: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/ingest
///
/// Multipart form: `resume_file`, `job_description`, `template_choice`.
/// Stores the upload, then runs extract → segment → complete.
pub async fn handle_ingest(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IngestResponse>, AppError> {
    let form = read_ingest_form(multipart).await?;
    let (filename, bytes) = form
        .file
        .ok_or_else(|| AppError::Validation("Please upload a resume.".to_string()))?;

    let stored = state.store.save(&filename, bytes.clone()).await?;
    let document = Document::new(stored.filename.clone(), bytes);
    let job_description = form.job_description.trim().to_string();

    let pipeline = state.pipeline.clone();
    let processed = run_blocking(move || pipeline.process(&document, &job_description)).await??;

    info!(
        "Ingested document {} ({:?}, {} bytes)",
        stored.id, stored.format, stored.size_bytes
    );

    Ok(Json(IngestResponse {
        document_id: stored.id,
        filename: stored.filename,
        format: stored.format,
        job_keywords: processed.job_skills.to_vec().join(", "),
        sections: processed.sections,
        job_skills: processed.job_skills,
        backfilled: processed.backfilled,
        template_choice: TemplateChoice::parse(form.template_choice.as_deref()),
    }))
}

/// POST /api/v1/resumes/sections
///
/// Segments raw text without backfilling.
pub async fn handle_segment(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SectionMap>, AppError> {
    let pipeline = state.pipeline.clone();
    let sections = run_blocking(move || pipeline.segment(&request.text)).await?;
    Ok(Json(sections))
}

/// POST /api/v1/resumes/skills
pub async fn handle_skills(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SkillsResponse>, AppError> {
    let pipeline = state.pipeline.clone();
    let skills = run_blocking(move || pipeline.extract_skills(&request.text)).await?;
    Ok(Json(SkillsResponse { skills }))
}

/// POST /api/v1/resumes/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, AppError> {
    let pipeline = state.pipeline.clone();
    let (sections, job_skills) = run_blocking(move || {
        pipeline.complete(request.sections, &request.job_description)
    })
    .await?;
    Ok(Json(CompleteResponse {
        sections,
        job_skills,
    }))
}

/// POST /api/v1/resumes/score
///
/// Applies edits, assembles the résumé text, and scores it against the job
/// description. Scoring is bounded by the configured timeout; a timeout or an
/// embedder failure is reported as an unavailable (`null`) score.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let mut sections = request.sections;
    sections.apply_edits(&request.edits);
    let template_choice = TemplateChoice::parse(request.template_choice.as_deref());

    let pipeline = state.pipeline.clone();
    let to_score = sections.clone();
    let job_description = request.job_description;
    let task = run_blocking(move || pipeline.score_sections(&to_score, &job_description));

    let ats_score = match tokio::time::timeout(state.score_timeout(), task).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                "Similarity scoring exceeded {}s; reporting score as unavailable",
                state.config.score_timeout_secs
            );
            None
        }
    };

    Ok(Json(ScoreResponse {
        ats_score,
        sections,
        template_choice,
    }))
}

/// GET /api/v1/uploads/:id
///
/// Returns the stored upload as an attachment.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let document = state.store.load(id).await?;
    let content_type = match document.format {
        DocumentFormat::Pdf => "application/pdf",
        DocumentFormat::Docx => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        DocumentFormat::PlainText => "application/octet-stream",
    };
    let disposition = format!("attachment; filename=\"{}\"", document.filename);

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// GET /api/v1/uploads/:id/sections
///
/// Re-extracts and segments a stored upload straight from the store.
pub async fn handle_upload_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadSectionsResponse>, AppError> {
    let path = state.store.open(id).await?;
    let pipeline = state.pipeline.clone();
    let text = run_blocking(move || pipeline.extract_path(&path)).await?;
    if text.trim().is_empty() {
        return Err(PipelineError::ExtractionFailed(id.to_string()).into());
    }

    let pipeline = state.pipeline.clone();
    let sections = run_blocking(move || pipeline.segment(&text)).await?;
    Ok(Json(UploadSectionsResponse {
        document_id: id,
        sections,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_ingest_form(mut multipart: Multipart) -> Result<IngestForm, AppError> {
    let mut form = IngestForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
                if !filename.is_empty() {
                    form.file = Some((filename, bytes));
                }
            }
            "job_description" | "template_choice" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed form field: {e}")))?;
                if name == "job_description" {
                    form.job_description = value;
                } else {
                    form.template_choice = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("pipeline task failed: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
