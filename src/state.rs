//! Shared application state, built once before the server binds.

use rusqlite::Connection;
use thiserror::Error;

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};
use crate::flow::intent::{IntentClassifier, KeywordIntent};
use crate::flow::session::SessionStore;
use crate::rag::embedder::EmbeddingModel;
#[cfg(not(feature = "onnx-embeddings"))]
use crate::rag::embedder::HashEmbedder;
use crate::rag::engine::RagEngine;
use crate::rag::generate::{OllamaGenerator, TextGenerator};
use crate::rag::RagError;

const GENERATION_TIMEOUT_SECS: u64 = 120;

/// Model identifier reported in cache metadata and by the health endpoint
/// when ONNX embeddings are active.
#[cfg(feature = "onnx-embeddings")]
const ONNX_MODEL_NAME: &str = "paraphrase-multilingual-MiniLM-L12-v2";

#[derive(Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Everything request handlers share. The engine is immutable after the
/// startup build; sessions carry their own interior locking.
pub struct AppState {
    pub config: AppConfig,
    pub engine: RagEngine,
    pub sessions: SessionStore,
    pub generator: Box<dyn TextGenerator + Send + Sync>,
    pub intent: Box<dyn IntentClassifier + Send + Sync>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Apply the database schema (plus demo seed when enabled), build or
    /// restore the vector index, and wire the generator client. Runs to
    /// completion before the listener binds; a corpus or embedding-model
    /// problem stops startup.
    pub fn init(config: AppConfig) -> Result<Self, StateError> {
        let conn = db::sqlite::open_database(&config.db_path)?;
        if config.seed_demo {
            db::seed::seed_demo_data(&conn)?;
        }
        drop(conn);

        let engine = RagEngine::build_or_load(&config.corpus_path, default_embedder()?)?;
        let generator = Box::new(OllamaGenerator::new(
            &config.ollama_url,
            &config.ollama_model,
            GENERATION_TIMEOUT_SECS,
        ));

        Ok(Self {
            config,
            engine,
            sessions: SessionStore::new(),
            generator,
            intent: Box::new(KeywordIntent),
        })
    }

    /// Per-request connection to the scheduling store.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::sqlite::open_database(&self.config.db_path)
    }
}

#[cfg(feature = "onnx-embeddings")]
fn default_embedder() -> Result<Box<dyn EmbeddingModel + Send + Sync>, RagError> {
    let model_dir = crate::config::embedding_model_dir();
    let model = crate::rag::embedder::OnnxEmbedder::load(&model_dir, ONNX_MODEL_NAME)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx-embeddings"))]
fn default_embedder() -> Result<Box<dyn EmbeddingModel + Send + Sync>, RagError> {
    Ok(Box::new(HashEmbedder::new()))
}
