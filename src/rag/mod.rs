//! Retrieval-augmented answering over the disease corpus.
//!
//! The pipeline is corpus → embeddings → vector index → retrieval → prompt →
//! external text generation. `engine::RagEngine` owns the loaded corpus and
//! the index; `answer::ask_question` drives one question through the full
//! pipeline.

pub mod answer;
pub mod cache;
pub mod corpus;
pub mod embedder;
pub mod engine;
pub mod generate;
pub mod index;
pub mod prompt;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("corpus file not found: {0}")]
    CorpusMissing(PathBuf),

    #[error("corpus file is malformed: {0}")]
    CorpusMalformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("embedding model initialization: {0}")]
    ModelInit(String),

    #[error("tokenization error: {0}")]
    Tokenization(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Ollama connection failed: {0}")]
    OllamaConnection(String),

    #[error("Ollama returned HTTP {status}: {body}")]
    OllamaStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}
