//! # askdocs
//!
//! A retrieval-augmented document question-answering HTTP service with
//! PII-aware prompting.
//!
//! askdocs ingests PDF and CSV uploads into a persistent SQLite-backed
//! vector index and answers natural-language questions against it by
//! retrieving the most similar chunks and prompting a locally-hosted LLM
//! (Ollama) with them. A fixed instruction block tells the model to
//! withhold personally identifiable information.
//!
//! ## Architecture
//!
//! ```text
//! POST /pdf ──▶ Loader ──▶ Chunker ──▶ Embedder ──▶ SQLite index
//!                                                       │
//! POST /ask_pdf ──▶ Embedder ──▶ similarity search ──▶ Prompt ──▶ LLM
//!
//! POST /ai ─────────────────────────────────────────────────────▶ LLM
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | PDF/CSV document loaders |
//! | [`chunk`] | Recursive character text splitter |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | LLM client (Ollama) |
//! | [`prompt`] | Prompt template with PII rules |
//! | [`store`] | SQLite-backed vector store |
//! | [`ingest`] | Ingestion pipeline |
//! | [`chain`] | Retrieval chain |
//! | [`server`] | HTTP server |

pub mod chain;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod models;
pub mod prompt;
pub mod server;
pub mod store;
