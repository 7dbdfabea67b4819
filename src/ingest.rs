//! Ingestion pipeline orchestration.
//!
//! Coordinates the flow for one staged upload: loader → chunker →
//! embedding → vector store. Persistence happens only after every chunk
//! has been embedded, so a load or embedding failure leaves the index
//! unmodified.

use anyhow::Result;
use std::path::Path;

use crate::chunk::chunk_documents;
use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::loader::{self, FileKind};
use crate::models::IngestSummary;
use crate::store::VectorStore;

/// Ingest one staged file into the vector store.
///
/// `source` is the original upload filename, carried into chunk metadata.
/// Returns the document and chunk counts for this call only — the store
/// is append-only and repeated ingestion of the same file is not
/// deduplicated.
pub async fn ingest_file(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    staged_path: &Path,
    source: &str,
    kind: FileKind,
) -> Result<IngestSummary> {
    let docs = loader::load_documents(staged_path, source, kind)?;
    let chunks = chunk_documents(
        &docs,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    );

    tracing::debug!(
        source = source,
        doc_len = docs.len(),
        chunk_count = chunks.len(),
        "loaded and chunked upload"
    );

    // Embed everything before touching the store.
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(config.embedding.batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embedded = embedding::embed_texts(provider, &config.embedding, &texts).await?;
        vectors.extend(embedded);
    }

    let store = VectorStore::open(&config.storage).await?;
    store
        .insert_chunks(&chunks, &vectors, provider.model_name())
        .await?;
    store.close().await;

    Ok(IngestSummary {
        doc_len: docs.len(),
        chunk_count: chunks.len(),
    })
}
