//! Document store: keeps uploaded résumé files so they can be re-read or
//! downloaded later. The pipeline itself only ever sees `Document` values.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::pipeline::{Document, DocumentFormat};

/// Fallback stored name when sanitising leaves nothing.
const DEFAULT_FILENAME: &str = "upload";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document {0} not found")]
    NotFound(Uuid),
}

/// Metadata for a saved upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    pub id: Uuid,
    pub filename: String,
    pub format: DocumentFormat,
    pub size_bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save(&self, filename: &str, bytes: Bytes) -> Result<StoredDocument, StorageError>;

    /// Loads a previously saved upload as a pipeline `Document`.
    async fn load(&self, id: Uuid) -> Result<Document, StorageError>;

    /// Resolves a saved upload to a readable file path.
    async fn open(&self, id: Uuid) -> Result<PathBuf, StorageError>;
}

/// Stores uploads as `<uuid>_<sanitised name>` under a single directory.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Creates the upload directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!("Document store at {}", root.display());
        Ok(Self { root })
    }

    async fn find(&self, id: Uuid) -> Result<(PathBuf, String), StorageError> {
        let prefix = format!("{id}_");
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(original) = name.strip_prefix(&prefix) {
                return Ok((entry.path(), original.to_string()));
            }
        }
        Err(StorageError::NotFound(id))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn save(&self, filename: &str, bytes: Bytes) -> Result<StoredDocument, StorageError> {
        let id = Uuid::new_v4();
        let filename = sanitize_filename(filename);
        let path = self.root.join(format!("{id}_{filename}"));
        tokio::fs::write(&path, &bytes).await?;
        debug!("Saved upload {id} ({} bytes) to {}", bytes.len(), path.display());

        Ok(StoredDocument {
            id,
            format: DocumentFormat::from_filename(&filename),
            filename,
            size_bytes: bytes.len(),
            uploaded_at: Utc::now(),
        })
    }

    async fn load(&self, id: Uuid) -> Result<Document, StorageError> {
        let (path, filename) = self.find(id).await?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(Document::new(filename, bytes))
    }

    async fn open(&self, id: Uuid) -> Result<PathBuf, StorageError> {
        let (path, _) = self.find(id).await?;
        Ok(path)
    }
}

/// Reduces an uploaded filename to a safe basename: path components are
/// dropped, only ASCII alphanumerics and `.-_` survive (spaces become `_`),
/// and leading dots are removed.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim_matches('_');
    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
