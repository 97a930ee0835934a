//! Text embedding backends.
//!
//! All backends produce 384-dimensional vectors so index artifacts stay
//! interchangeable. The hashed bag-of-words embedder is always available and
//! keeps the service usable without model files; the ONNX backend (behind
//! the `onnx-embeddings` feature) runs real sentence-transformer inference.

use super::RagError;

/// Embedding width shared by all backends. Matches
/// paraphrase-multilingual-MiniLM-L12-v2, the reference sentence model.
pub const EMBEDDING_DIM: usize = 384;

/// Embedding model abstraction.
///
/// `embed_batch` must equal per-text `embed` calls: batching bounds memory,
/// it must never change the vectors.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError>;
    fn dimension(&self) -> usize;
    fn model_name(&self) -> &str;
}

impl<T: EmbeddingModel + ?Sized> EmbeddingModel for Box<T> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX Embedder — behind `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;

    use super::{EmbeddingModel, EMBEDDING_DIM};
    use crate::rag::RagError;

    /// Sentence-transformer inference via ONNX Runtime.
    ///
    /// Requires two files in the model directory:
    /// - `model.onnx` — the exported model weights
    /// - `tokenizer.json` — HuggingFace tokenizer definition
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires
    /// `&mut self` while the EmbeddingModel trait exposes `&self`.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
        model_name: String,
    }

    impl OnnxEmbedder {
        /// Load the model from a directory containing `model.onnx` and
        /// `tokenizer.json`. `model_name` is the identifier recorded in
        /// cache metadata and reported by the health endpoint.
        pub fn load(model_dir: &Path, model_name: &str) -> Result<Self, RagError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(RagError::ModelNotFound(model_path));
            }
            if !tokenizer_path.exists() {
                return Err(RagError::ModelNotFound(tokenizer_path));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| RagError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| RagError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| RagError::ModelInit(format!("ONNX load failed: {e}")))?;

            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| RagError::ModelInit(format!("tokenizer load failed: {e}")))?;

            tracing::info!(model = %model_name, dir = %model_dir.display(), "ONNX embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                model_name: model_name.to_string(),
            })
        }

        /// Tokenize, run inference, mean-pool with the attention mask and
        /// L2-normalize.
        fn infer(&self, text: &str) -> Result<Vec<f32>, RagError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| RagError::Tokenization(e.to_string()))?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let token_type_ids: Vec<i64> = encoding
                .get_type_ids()
                .iter()
                .map(|&t| t as i64)
                .collect();

            let seq_len = input_ids.len();

            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
                .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;
            let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask.clone())
                .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;
            let type_array = ndarray::Array2::from_shape_vec((1, seq_len), token_type_ids)
                .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;
            let type_tensor = TensorRef::from_array_view(&type_array)
                .map_err(|e| RagError::EmbeddingFailed(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| RagError::EmbeddingFailed("session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| RagError::EmbeddingFailed(format!("ONNX inference failed: {e}")))?;

            // Output shape: [1, seq_len, EMBEDDING_DIM]
            let (shape, output_data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| RagError::EmbeddingFailed(format!("output extraction: {e}")))?;

            if shape.len() != 3 || shape[2] as usize != EMBEDDING_DIM {
                return Err(RagError::EmbeddingFailed(format!(
                    "unexpected output shape {shape:?}, expected [1, {seq_len}, {EMBEDDING_DIM}]"
                )));
            }

            let mut pooled = vec![0.0f32; EMBEDDING_DIM];
            let mut mask_sum = 0.0f32;

            for (token_idx, &mask_val_i64) in attention_mask.iter().enumerate().take(seq_len) {
                let mask_val = mask_val_i64 as f32;
                mask_sum += mask_val;
                let offset = token_idx * EMBEDDING_DIM;
                for (dim_idx, p) in pooled.iter_mut().enumerate() {
                    *p += output_data[offset + dim_idx] * mask_val;
                }
            }

            if mask_sum > 0.0 {
                for val in &mut pooled {
                    *val /= mask_sum;
                }
            }

            let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for val in &mut pooled {
                    *val /= norm;
                }
            }

            Ok(pooled)
        }
    }

    impl EmbeddingModel for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
            self.infer(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
            texts.iter().map(|t| self.infer(t)).collect()
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::OnnxEmbedder;

/// Deterministic hashed bag-of-words embedder.
///
/// Each token is hashed into one of 384 signed buckets and the result is
/// L2-normalized, so texts sharing vocabulary score high under inner
/// product. No model files needed; the same text always embeds to the same
/// vector, which also makes it the embedder used throughout the tests.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(hashed_bag_of_words(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts
            .iter()
            .map(|t| hashed_bag_of_words(t, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashed-bow-384"
    }
}

/// Hash every token into a signed bucket, then L2-normalize. The sign bit
/// comes from the hash so opposing tokens cancel instead of piling up in
/// the same direction.
fn hashed_bag_of_words(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];

    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let hash = fnv1a(token.as_bytes());
        let bucket = (hash % dim as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign;
    }

    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut vec {
            *val /= norm;
        }
    }

    vec
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_returns_correct_dimension() {
        let embedder = HashEmbedder::new();
        let vec = embedder.embed("baş ağrısı ve mide bulantısı").unwrap();
        assert_eq!(vec.len(), EMBEDDING_DIM);
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    fn embed_is_deterministic() {
        let embedder = HashEmbedder::new();
        let v1 = embedder.embed("aynı metin").unwrap();
        let v2 = embedder.embed("aynı metin").unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn different_texts_differ() {
        let embedder = HashEmbedder::new();
        let v1 = embedder.embed("grip belirtileri").unwrap();
        let v2 = embedder.embed("kalp çarpıntısı").unwrap();
        assert_ne!(v1, v2);
    }

    #[test]
    fn embed_is_l2_normalized() {
        let embedder = HashEmbedder::new();
        let vec = embedder.embed("ateş öksürük halsizlik").unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.001,
            "vector should be unit length, got norm = {norm}"
        );
    }

    #[test]
    fn batch_boundaries_do_not_change_vectors() {
        let embedder = HashEmbedder::new();
        let texts = ["bir", "iki", "üç"];
        let batched = embedder.embed_batch(&texts).unwrap();
        assert_eq!(batched.len(), 3);
        for (text, vec) in texts.iter().zip(&batched) {
            assert_eq!(vec, &embedder.embed(text).unwrap());
        }
    }

    #[test]
    fn shared_vocabulary_scores_higher_than_disjoint() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("baş ağrısı mide bulantısı").unwrap();
        let b = embedder.embed("baş ağrısı yorgunluk").unwrap();
        let c = embedder.embed("diz ekleminde şişlik").unwrap();

        let dot = |x: &[f32], y: &[f32]| -> f32 { x.iter().zip(y).map(|(p, q)| p * q).sum() };
        assert!(dot(&a, &b) > dot(&a, &c));
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new();
        let vec = embedder.embed("").unwrap();
        assert!(vec.iter().all(|&x| x == 0.0));
    }
}
