//! Retrieval chain: answer a question against the ingested corpus.
//!
//! Opens the vector store fresh for every call so writes from concurrent
//! ingestion requests are visible, embeds the query with the same provider
//! used at ingestion, retrieves the top chunks above the similarity
//! threshold, and asks the LLM with the rendered prompt. Zero qualifying
//! chunks is not an error — the prompt renders with empty context and the
//! model answers ungrounded.

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::llm::LlmClient;
use crate::prompt;
use crate::store::VectorStore;

pub async fn answer_question(
    config: &Config,
    llm: &LlmClient,
    provider: &dyn EmbeddingProvider,
    query: &str,
) -> Result<String> {
    let store = VectorStore::open(&config.storage).await?;

    let query_vec = embedding::embed_query(provider, &config.embedding, query).await?;
    let retrieved = store
        .similarity_search(
            &query_vec,
            config.retrieval.top_k,
            config.retrieval.score_threshold,
        )
        .await?;
    store.close().await;

    tracing::debug!(
        retrieved = retrieved.len(),
        top_score = retrieved.first().map(|c| c.score).unwrap_or(0.0),
        "retrieval complete"
    );

    let context = prompt::format_context(&retrieved);
    let rendered = prompt::render_prompt(query, &context);

    llm.generate(&rendered).await
}
