//! `GET /health` — liveness plus a snapshot of the loaded index.
//!
//! The engine is built before the listener binds, so a process that answers
//! at all always reports a loaded index.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::rag::cache::CacheFilesExist;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub rag_loaded: bool,
    pub data_count: usize,
    pub model_name: String,
    pub embedding_dimension: usize,
    // Wire name kept from the service this replaced; clients key on it.
    #[serde(rename = "faiss_total_vectors")]
    pub total_vectors: usize,
    pub cache_files_exist: CacheFilesExist,
}

pub async fn health(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let engine = &ctx.state.engine;
    Json(HealthResponse {
        status: "healthy",
        rag_loaded: true,
        data_count: engine.data_count(),
        model_name: engine.model_name().to_string(),
        embedding_dimension: engine.embedding_dimension(),
        total_vectors: engine.total_vectors(),
        cache_files_exist: engine.cache_files_exist(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_vectors_keeps_its_legacy_wire_name() {
        let body = HealthResponse {
            status: "healthy",
            rag_loaded: true,
            data_count: 2,
            model_name: "hashed-bow-384".into(),
            embedding_dimension: 384,
            total_vectors: 2,
            cache_files_exist: CacheFilesExist {
                embeddings: true,
                index: true,
                metadata: true,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["faiss_total_vectors"], 2);
        assert_eq!(json["status"], "healthy");
        assert!(json.get("total_vectors").is_none());
    }
}
