//! Core data models used throughout askdocs.
//!
//! These types represent the documents, chunks, and retrieval results that
//! flow through the ingestion and question-answering pipeline.

/// A raw text document produced by a loader before chunking.
///
/// One per CSV record or PDF page. Immutable once created.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original filename of the uploaded file.
    pub source: String,
    /// Page number (PDF) or record number (CSV), 1-based.
    pub position: i64,
    /// Whether `position` counts pages or records.
    pub position_kind: PositionKind,
    /// Extracted plain text.
    pub text: String,
}

/// What the `position` field of a [`Document`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    Page,
    Record,
}

impl PositionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionKind::Page => "page",
            PositionKind::Record => "record",
        }
    }
}

impl Document {
    /// `"page 3"` / `"record 12"` style locator carried into chunk metadata.
    pub fn locator(&self) -> String {
        format!("{} {}", self.position_kind.as_str(), self.position)
    }
}

/// A chunk of a document's text, sized to fit model context limits.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    /// Original filename, inherited from the parent document.
    pub source: String,
    /// Locator inherited from the parent document.
    pub locator: String,
    /// Position within the chunk sequence of one ingestion call.
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of the chunk text.
    pub hash: String,
}

/// A chunk returned from similarity search, with its score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub source: String,
    pub locator: String,
    pub text: String,
    /// Cosine similarity against the query embedding, in `[-1.0, 1.0]`.
    pub score: f64,
}

/// Counts reported by one ingestion call.
///
/// Counts cover this call only; the store is append-only, so re-ingesting
/// the same file reports the same counts while the index keeps growing.
#[derive(Debug, Clone, Copy)]
pub struct IngestSummary {
    pub doc_len: usize,
    pub chunk_count: usize,
}
