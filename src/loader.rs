//! Document loaders for uploaded files.
//!
//! Dispatch is by filename extension, case-insensitive. CSV files yield one
//! [`Document`] per record, with each field rendered as a `name: value`
//! line; PDF files yield one [`Document`] per extracted page.

use std::path::Path;

use crate::models::{Document, PositionKind};

/// Supported upload types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Csv,
}

impl FileKind {
    /// Determine the file kind from a filename's extension,
    /// case-insensitive. Returns `None` for anything that is not
    /// `.pdf` or `.csv`.
    pub fn from_filename(name: &str) -> Option<FileKind> {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Some(FileKind::Pdf),
            Some("csv") => Some(FileKind::Csv),
            _ => None,
        }
    }
}

/// Loader error. Parse failures propagate to the request boundary
/// untranslated; there is no partial-document recovery.
#[derive(Debug)]
pub enum LoadError {
    Io(String),
    Pdf(String),
    Csv(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read staged file: {}", e),
            LoadError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            LoadError::Csv(e) => write!(f, "CSV parsing failed: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

/// Load a staged file into documents. `source` is the original upload
/// filename and is carried into every document's metadata.
pub fn load_documents(path: &Path, source: &str, kind: FileKind) -> Result<Vec<Document>, LoadError> {
    match kind {
        FileKind::Pdf => load_pdf(path, source),
        FileKind::Csv => load_csv(path, source),
    }
}

/// One document per extracted page. Pages with no extractable text are
/// dropped rather than producing empty chunks.
fn load_pdf(path: &Path, source: &str) -> Result<Vec<Document>, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io(e.to_string()))?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| LoadError::Pdf(e.to_string()))?;

    let docs = pages
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Document {
            source: source.to_string(),
            position: (i + 1) as i64,
            position_kind: PositionKind::Page,
            text: text.trim().to_string(),
        })
        .collect();

    Ok(docs)
}

/// One document per record. Each field becomes a `header: value` line so
/// the chunk text stays self-describing after the header row is gone.
fn load_csv(path: &Path, source: &str) -> Result<Vec<Document>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| LoadError::Csv(e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| LoadError::Csv(e.to_string()))?
        .clone();

    let mut docs = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| LoadError::Csv(e.to_string()))?;
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect::<Vec<_>>()
            .join("\n");

        docs.push(Document {
            source: source.to_string(),
            position: (i + 1) as i64,
            position_kind: PositionKind::Record,
            text,
        });
    }

    Ok(docs)
}
