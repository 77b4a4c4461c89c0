// Document Extraction Service
// Plain text and metadata from PDF and DOCX files

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use zip::ZipArchive;

pub const VALID_EXTENSIONS: &[&str] = &[".pdf", ".docx"];

const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("Unsupported file type: '{0}' (expected .pdf or .docx)")]
    UnsupportedFormat(String),
    #[error("No extractable text found in {0}")]
    NoText(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match file_extension(path).as_str() {
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_count: Option<usize>,
    /// Estimated from form feeds; pdf-extract does not report pages directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub kind: DocumentKind,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Lowercased extension with its dot (".pdf"), or "" when there is none.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn is_valid_file_type(path: &Path) -> bool {
    VALID_EXTENSIONS.contains(&file_extension(path).as_str())
}

/// Read and extract a document. Whitespace-only output is `NoText`, the
/// signal that analysis must not run.
pub fn extract_text(path: &Path) -> Result<ExtractedDocument, ExtractionError> {
    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| ExtractionError::UnsupportedFormat(file_extension(path)))?;

    let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let document = extract_bytes(kind, &bytes)?;
    if document.text.trim().is_empty() {
        warn!("[EXTRACT] No extractable text found in {}", path.display());
        return Err(ExtractionError::NoText(path.display().to_string()));
    }

    info!(
        "[EXTRACT] {} -> {} chars ({:?})",
        path.display(),
        document.text.chars().count(),
        kind
    );
    Ok(document)
}

pub fn extract_bytes(kind: DocumentKind, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    let page_count = text.matches('\x0C').count().max(1);

    Ok(ExtractedDocument {
        kind: DocumentKind::Pdf,
        text,
        metadata: DocumentMetadata {
            page_count: Some(page_count),
            ..Default::default()
        },
    })
}

fn extract_docx(bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
    let docx = read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut paragraph_count = 0usize;
    let mut paragraphs: Vec<String> = Vec::new();
    for child in docx.document.children.iter() {
        let DocumentChild::Paragraph(para) = child else {
            continue;
        };
        paragraph_count += 1;

        let text: String = para
            .children
            .iter()
            .filter_map(|pc| match pc {
                ParagraphChild::Run(run) => Some(run),
                _ => None,
            })
            .flat_map(|run| run.children.iter())
            .filter_map(|rc| match rc {
                RunChild::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();

        if !text.trim().is_empty() {
            paragraphs.push(text);
        }
    }

    let mut metadata = read_core_properties(bytes).unwrap_or_default();
    metadata.paragraph_count = Some(paragraph_count);

    Ok(ExtractedDocument {
        kind: DocumentKind::Docx,
        text: paragraphs.join("\n"),
        metadata,
    })
}

/// Core properties part of the package; `None` when absent or unreadable.
fn read_core_properties(bytes: &[u8]) -> Option<DocumentMetadata> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut part = archive.by_name(CORE_PROPERTIES_PART).ok()?;
    let mut xml = String::new();
    part.read_to_string(&mut xml).ok()?;
    Some(parse_core_properties(&xml))
}

fn parse_core_properties(xml: &str) -> DocumentMetadata {
    DocumentMetadata {
        title: xml_element(xml, "dc:title"),
        author: xml_element(xml, "dc:creator"),
        created: xml_element(xml, "dcterms:created"),
        modified: xml_element(xml, "dcterms:modified"),
        last_modified_by: xml_element(xml, "cp:lastModifiedBy"),
        revision: xml_element(xml, "cp:revision"),
        ..Default::default()
    }
}

/// Text of the first `<tag ...>text</tag>` element, entity-decoded; empty elements are `None`.
fn xml_element(xml: &str, tag: &str) -> Option<String> {
    let escaped = regex::escape(tag);
    let re = Regex::new(&format!(r"<{0}(?:\s[^>]*)?>([^<]*)</{0}>", escaped)).ok()?;
    let raw = re.captures(xml)?.get(1)?.as_str().trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&"),
    )
}
