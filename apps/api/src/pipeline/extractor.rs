//! Text Extractor: converts an uploaded document into plain text.
//!
//! Extraction never fails outward: any parse or read error is logged and
//! degrades to an empty string, which callers treat as "no text available".

use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::{bail, Result};
use bytes::Bytes;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Upper bound on the decompressed size of `word/document.xml`.
pub const DEFAULT_MAX_DOCX_XML_BYTES: u64 = 64 * 1024 * 1024;

/// Closed set of recognised source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Plain text, and the fallback for every unrecognised extension.
    PlainText,
}

impl DocumentFormat {
    /// Derives the format from a filename's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => DocumentFormat::Pdf,
            Some("docx") => DocumentFormat::Docx,
            _ => DocumentFormat::PlainText,
        }
    }
}

/// Raw uploaded bytes plus the format they should be read as.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub format: DocumentFormat,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        Self {
            format: DocumentFormat::from_filename(&filename),
            filename,
            bytes: bytes.into(),
        }
    }
}

/// Format-dispatching extractor. DOCX matchers are compiled once here.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    docx: Option<DocxPatterns>,
    max_docx_xml_bytes: u64,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCX_XML_BYTES)
    }
}

impl TextExtractor {
    pub fn new(max_docx_xml_bytes: u64) -> Self {
        let docx = match DocxPatterns::new() {
            Ok(patterns) => Some(patterns),
            Err(e) => {
                warn!("DOCX patterns failed to compile; DOCX text will be empty: {e}");
                None
            }
        };
        Self {
            docx,
            max_docx_xml_bytes,
        }
    }

    /// Extracts plain text from `document`. Returns `""` when nothing can be read.
    pub fn extract(&self, document: &Document) -> String {
        let text = match document.format {
            DocumentFormat::Pdf => extract_pdf(&document.bytes),
            DocumentFormat::Docx => self.extract_docx(&document.bytes),
            DocumentFormat::PlainText => Some(decode_plain_text(&document.bytes)),
        };

        match text {
            Some(text) => {
                debug!(
                    "Extracted {} chars from '{}' ({:?})",
                    text.len(),
                    document.filename,
                    document.format
                );
                text
            }
            None => {
                warn!(
                    "Text extraction failed for '{}' ({:?})",
                    document.filename, document.format
                );
                String::new()
            }
        }
    }

    /// Reads `path` from disk and extracts it, deriving the format from the
    /// extension. I/O failure yields `""`.
    pub fn extract_path(&self, path: &Path) -> String {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        match std::fs::read(path) {
            Ok(bytes) => self.extract(&Document::new(filename, bytes)),
            Err(e) => {
                warn!("Failed to read '{}': {e}", path.display());
                String::new()
            }
        }
    }

    /// Joins the text of every `<w:p>` paragraph in document order with `\n`.
    fn extract_docx(&self, bytes: &[u8]) -> Option<String> {
        let patterns = self.docx.as_ref()?;
        let xml = match read_docx_body(bytes, self.max_docx_xml_bytes) {
            Ok(xml) => xml,
            Err(e) => {
                debug!("Could not read DOCX body: {e}");
                return None;
            }
        };
        Some(patterns.paragraphs(&xml).join("\n"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PDF
// ────────────────────────────────────────────────────────────────────────────

/// Page-by-page extraction via lopdf. Pages that fail contribute nothing.
/// If lopdf cannot open the file or finds no text at all, pdf-extract gets a
/// second attempt over the whole buffer.
fn extract_pdf(bytes: &[u8]) -> Option<String> {
    match extract_pdf_pages(bytes) {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => extract_pdf_whole(bytes),
    }
}

fn extract_pdf_pages(bytes: &[u8]) -> Option<String> {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("lopdf could not load PDF: {e}");
            return None;
        }
    };

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page) if !page.is_empty() => {
                text.push_str(&page);
                text.push('\n');
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping PDF page {page_number}: {e}"),
        }
    }
    Some(text)
}

fn extract_pdf_whole(bytes: &[u8]) -> Option<String> {
    // pdf-extract panics on some malformed inputs.
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            debug!("pdf-extract failed: {e}");
            None
        }
        Err(_) => {
            debug!("pdf-extract panicked on malformed input");
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

const DOCX_BODY: &str = "word/document.xml";

/// Reads the main document part, refusing to inflate more than `limit` bytes.
fn read_docx_body(bytes: &[u8], limit: u64) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let file = archive.by_name(DOCX_BODY)?;
    if file.size() > limit {
        bail!("{DOCX_BODY} declares {} bytes, limit is {limit}", file.size());
    }

    // The declared size is untrusted; cap the actual read as well.
    let mut xml = String::new();
    file.take(limit + 1).read_to_string(&mut xml)?;
    if xml.len() as u64 > limit {
        bail!("{DOCX_BODY} inflates past {limit} bytes");
    }
    Ok(xml)
}

#[derive(Debug, Clone)]
struct DocxPatterns {
    /// `<w:p>`, `<w:p attr=..>`, self-closing `<w:p/>`, or `</w:p>`; not `<w:pPr>`.
    paragraph_tag: Regex,
    run: Regex,
    entity: Regex,
}

impl DocxPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            paragraph_tag: Regex::new(r"<w:p(?:\s[^>]*?)?/?>|</w:p>")?,
            run: Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br/>|<w:cr/>")?,
            entity: Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);")?,
        })
    }

    /// Paragraph texts in order of their opening tags. A paragraph nested
    /// inside another (text boxes) becomes its own entry and its runs are not
    /// counted toward the enclosing paragraph. Unclosed paragraphs are dropped.
    fn paragraphs(&self, xml: &str) -> Vec<String> {
        let mut open: Vec<(usize, String)> = Vec::new();
        let mut done: Vec<(usize, String)> = Vec::new();
        let mut cursor = 0;
        let mut next_index = 0;

        for tag in self.paragraph_tag.find_iter(xml) {
            if let Some((_, content)) = open.last_mut() {
                content.push_str(&xml[cursor..tag.start()]);
            }
            cursor = tag.end();

            let tag = tag.as_str();
            if tag == "</w:p>" {
                if let Some((index, content)) = open.pop() {
                    done.push((index, self.paragraph_text(&content)));
                }
            } else if tag.ends_with("/>") {
                done.push((next_index, String::new()));
                next_index += 1;
            } else {
                open.push((next_index, String::new()));
                next_index += 1;
            }
        }

        done.sort_by_key(|(index, _)| *index);
        done.into_iter().map(|(_, text)| text).collect()
    }

    fn paragraph_text(&self, content: &str) -> String {
        let mut text = String::new();
        for run in self.run.captures_iter(content) {
            match (run.get(1), run.get(0).map(|m| m.as_str())) {
                (Some(t), _) => text.push_str(&decode_entities(&self.entity, t.as_str())),
                (None, Some("<w:tab/>")) => text.push('\t'),
                (None, _) => text.push('\n'),
            }
        }
        text
    }
}

fn decode_entities(entity: &Regex, text: &str) -> String {
    entity
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map(String::from).unwrap_or_default()
        })
        .into_owned()
}

// ────────────────────────────────────────────────────────────────────────────
// Plain text
// ────────────────────────────────────────────────────────────────────────────

/// UTF-8 decode where undecodable byte sequences are dropped, not replaced.
/// `\r\n` and lone `\r` line endings become `\n`.
fn decode_plain_text(bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        decoded.push_str(chunk.valid());
    }
    normalize_line_endings(&decoded)
}

fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
