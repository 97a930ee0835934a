//! Corpus index lifecycle and similarity search.
//!
//! `RagEngine::build_or_load` runs once at startup: load the corpus, then
//! either restore a validated cache or embed everything and build the index
//! fresh. The engine is immutable afterwards, so request handlers share it
//! behind `Arc` without locking.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cache::{self, CacheFilesExist, CachePaths, CachedBundle, IndexMetadata};
use super::corpus::{self, CorpusRecord};
use super::embedder::EmbeddingModel;
use super::index::{normalize_l2, VectorIndex};
use super::RagError;

/// Texts are embedded this many at a time to bound peak memory. Batch size
/// never affects the vectors themselves.
pub const EMBED_BATCH_SIZE: usize = 32;

/// One retrieved corpus entry: the full record, the text the match was
/// scored on, and its row in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub content: CorpusRecord,
    pub text: String,
    pub index: usize,
}

pub struct RagEngine {
    corpus_path: PathBuf,
    cache_paths: CachePaths,
    embedder: Box<dyn EmbeddingModel + Send + Sync>,
    records: Vec<CorpusRecord>,
    texts: Vec<String>,
    index: VectorIndex,
}

impl RagEngine {
    /// Load the corpus and restore the cached index for it, falling back to
    /// a full rebuild when the cache is absent, unreadable or out of step
    /// with the corpus. Corpus errors are fatal; cache errors never are.
    pub fn build_or_load(
        corpus_path: &Path,
        embedder: Box<dyn EmbeddingModel + Send + Sync>,
    ) -> Result<Self, RagError> {
        let records = corpus::load_corpus(corpus_path)?;
        let texts: Vec<String> = records.iter().map(CorpusRecord::search_text).collect();
        let cache_paths = CachePaths::for_corpus(corpus_path);

        if cache_paths.all_exist() {
            match cache::load(&cache_paths) {
                Ok(bundle) if bundle_matches(&bundle, &texts, &embedder) => {
                    tracing::info!(
                        records = records.len(),
                        "vector index restored from cache"
                    );
                    return Ok(Self {
                        corpus_path: corpus_path.to_path_buf(),
                        cache_paths,
                        embedder,
                        records,
                        texts,
                        index: bundle.index,
                    });
                }
                Ok(_) => {
                    tracing::warn!("cache disagrees with corpus, rebuilding index");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cache unreadable, rebuilding index");
                }
            }
        }

        let (embeddings, index) = embed_corpus(&texts, &embedder)?;

        let metadata = IndexMetadata {
            records: records.clone(),
            search_texts: texts.clone(),
            model_name: embedder.model_name().to_string(),
            embedding_dim: embedder.dimension(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = cache::save(&cache_paths, &embeddings, &index, &metadata) {
            // Serving continues from the in-memory index regardless.
            tracing::warn!(error = %e, "failed to write index cache");
        }

        tracing::info!(records = records.len(), "vector index built");
        Ok(Self {
            corpus_path: corpus_path.to_path_buf(),
            cache_paths,
            embedder,
            records,
            texts,
            index,
        })
    }

    /// Top-`top_k` records for a free-text query, keeping only hits with
    /// `score >= threshold`. Fewer than `top_k` results is a normal outcome.
    pub fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<(Vec<RetrievedDoc>, Vec<f32>), RagError> {
        let mut query_vec = self.embedder.embed(query)?;
        normalize_l2(&mut query_vec);

        let mut docs = Vec::new();
        let mut scores = Vec::new();
        for (row, score) in self.index.search(&query_vec, top_k) {
            if score < threshold {
                continue;
            }
            docs.push(RetrievedDoc {
                content: self.records[row].clone(),
                text: self.texts[row].clone(),
                index: row,
            });
            scores.push(score);
        }

        Ok((docs, scores))
    }

    pub fn data_count(&self) -> usize {
        self.records.len()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn total_vectors(&self) -> usize {
        self.index.len()
    }

    pub fn corpus_path(&self) -> &Path {
        &self.corpus_path
    }

    pub fn cache_files_exist(&self) -> CacheFilesExist {
        self.cache_paths.existing()
    }

    /// Delete the cache artifacts. The in-memory index keeps serving; the
    /// next process start performs a fresh build.
    pub fn clear_cache(&self) -> Result<Vec<String>, RagError> {
        self.cache_paths.clear()
    }
}

/// The cache is only served when it is internally consistent, produced by
/// the same model, and built from exactly the texts the current corpus
/// yields.
fn bundle_matches(
    bundle: &CachedBundle,
    texts: &[String],
    embedder: &(dyn EmbeddingModel + Send + Sync),
) -> bool {
    bundle.is_consistent()
        && bundle.metadata.model_name == embedder.model_name()
        && bundle.metadata.embedding_dim == embedder.dimension()
        && bundle.metadata.search_texts == texts
}

fn embed_corpus(
    texts: &[String],
    embedder: &(dyn EmbeddingModel + Send + Sync),
) -> Result<(Vec<Vec<f32>>, VectorIndex), RagError> {
    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

    for (batch_idx, chunk) in texts.chunks(EMBED_BATCH_SIZE).enumerate() {
        let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
        for mut vector in embedder.embed_batch(&refs)? {
            normalize_l2(&mut vector);
            embeddings.push(vector);
        }
        if batch_idx % 10 == 0 {
            tracing::info!(
                processed = embeddings.len(),
                total = texts.len(),
                "embedding corpus"
            );
        }
    }

    let index = VectorIndex::build(embeddings.clone(), embedder.dimension());
    Ok((embeddings, index))
}
