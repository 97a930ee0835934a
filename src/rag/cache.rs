//! On-disk cache for the built index.
//!
//! Three sibling artifacts per corpus file, named after the corpus path:
//! the raw vector matrix, the serialized index structure, and a metadata
//! blob tying both back to the records and the embedding model. A bundle is
//! only served when all three load and agree with each other and with the
//! current corpus; anything less is discarded and rebuilt.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::corpus::CorpusRecord;
use super::index::VectorIndex;
use super::RagError;

/// Locations of the three cache artifacts for one corpus file.
#[derive(Debug, Clone)]
pub struct CachePaths {
    pub embeddings: PathBuf,
    pub index: PathBuf,
    pub metadata: PathBuf,
}

impl CachePaths {
    pub fn for_corpus(corpus_path: &Path) -> Self {
        let base = corpus_path.display();
        Self {
            embeddings: PathBuf::from(format!("{base}_embeddings.json")),
            index: PathBuf::from(format!("{base}_index.json")),
            metadata: PathBuf::from(format!("{base}_metadata.json")),
        }
    }

    /// All three artifacts present. A partial cache is treated as absent.
    pub fn all_exist(&self) -> bool {
        self.embeddings.exists() && self.index.exists() && self.metadata.exists()
    }

    /// Per-artifact presence, as reported by the health endpoint.
    pub fn existing(&self) -> CacheFilesExist {
        CacheFilesExist {
            embeddings: self.embeddings.exists(),
            index: self.index.exists(),
            metadata: self.metadata.exists(),
        }
    }

    /// Delete whichever artifacts exist and return their paths. The next
    /// engine start rebuilds from scratch.
    pub fn clear(&self) -> Result<Vec<String>, RagError> {
        let mut deleted = Vec::new();
        for path in [&self.embeddings, &self.index, &self.metadata] {
            if path.exists() {
                std::fs::remove_file(path)?;
                deleted.push(path.display().to_string());
            }
        }
        Ok(deleted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFilesExist {
    pub embeddings: bool,
    pub index: bool,
    pub metadata: bool,
}

/// Metadata artifact: the records and search texts the vectors were built
/// from, plus the model identity that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub records: Vec<CorpusRecord>,
    pub search_texts: Vec<String>,
    pub model_name: String,
    pub embedding_dim: usize,
    pub created_at: String,
}

/// A fully parsed cache: all three artifacts, not yet validated.
pub struct CachedBundle {
    pub embeddings: Vec<Vec<f32>>,
    pub index: VectorIndex,
    pub metadata: IndexMetadata,
}

/// Write all three artifacts. Callers treat failure as a warning; the
/// in-memory index keeps serving either way.
pub fn save(
    paths: &CachePaths,
    embeddings: &[Vec<f32>],
    index: &VectorIndex,
    metadata: &IndexMetadata,
) -> Result<(), RagError> {
    std::fs::write(&paths.embeddings, serde_json::to_vec(embeddings)?)?;
    std::fs::write(&paths.index, serde_json::to_vec(index)?)?;
    std::fs::write(&paths.metadata, serde_json::to_vec(metadata)?)?;
    Ok(())
}

/// Parse all three artifacts. Any read or deserialize failure surfaces as an
/// error; the caller falls back to a rebuild, never to a partial cache.
pub fn load(paths: &CachePaths) -> Result<CachedBundle, RagError> {
    let embeddings: Vec<Vec<f32>> =
        serde_json::from_slice(&std::fs::read(&paths.embeddings)?)?;
    let index: VectorIndex = serde_json::from_slice(&std::fs::read(&paths.index)?)?;
    let metadata: IndexMetadata = serde_json::from_slice(&std::fs::read(&paths.metadata)?)?;
    Ok(CachedBundle {
        embeddings,
        index,
        metadata,
    })
}

impl CachedBundle {
    /// A bundle is internally consistent when vector count, index size and
    /// metadata rows all agree. Checked against the live corpus separately.
    pub fn is_consistent(&self) -> bool {
        let n = self.embeddings.len();
        n == self.index.len()
            && n == self.metadata.records.len()
            && n == self.metadata.search_texts.len()
    }
}
