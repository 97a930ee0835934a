//! Assistant endpoints.
//!
//! - `POST /ask` — answer a question, driving the appointment flow when the
//!   session is in one
//! - `GET /search/:query` — raw similarity search without generation
//! - `DELETE /cache` — drop the cached index artifacts
//!
//! Retrieval and generation are blocking (ONNX inference, a synchronous
//! HTTP client), so the handlers push the work onto the blocking pool.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::flow::machine::AppointmentFlow;
use crate::rag::answer::ask_question;
use crate::rag::engine::RetrievedDoc;
use crate::state::AppState;

/// Sessions untouched for this long are dropped on the next turn.
const SESSION_MAX_AGE_HOURS: i64 = 1;

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: Option<String>,
    pub session_id: Option<String>,
    pub patient_name: Option<String>,
    pub top_k: Option<usize>,
    pub similarity_threshold: Option<f32>,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub relevant_docs: Vec<RetrievedDoc>,
    pub similarity_scores: Vec<f32>,
    pub processing_time: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub session_id: String,
    pub flow_state: &'static str,
}

/// `POST /ask` — one conversational turn.
///
/// A session mid-booking goes straight to the state machine without a
/// retrieval call. Otherwise the question is answered through the RAG
/// pipeline and, when the answer names a department and intent is strong,
/// the flow's confirmation prompt is appended.
pub async fn ask(
    State(ctx): State<ApiContext>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = req
        .question
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("'question' alanı zorunlu".into()));
    }

    let session_id = req
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let top_k = req.top_k.unwrap_or(ctx.state.config.default_top_k);
    let threshold = req
        .similarity_threshold
        .unwrap_or(ctx.state.config.default_threshold);

    let state = ctx.state.clone();
    let sid = session_id.clone();
    let patient_name = req.patient_name;
    let response = tokio::task::spawn_blocking(move || {
        answer_turn(&state, &sid, patient_name, &question, top_k, threshold)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))??;

    Ok(Json(response))
}

/// One full turn, run on the blocking pool: session lookup, flow dispatch
/// or RAG answer, flow entry check.
fn answer_turn(
    state: &AppState,
    session_id: &str,
    patient_name: Option<String>,
    question: &str,
    top_k: usize,
    threshold: f32,
) -> Result<AskResponse, ApiError> {
    let purged = state
        .sessions
        .purge_older_than(chrono::Duration::hours(SESSION_MAX_AGE_HOURS));
    if purged > 0 {
        tracing::debug!(purged, "stale sessions dropped");
    }

    let cell = state.sessions.entry(session_id)?;
    let mut session = cell
        .lock()
        .map_err(|_| ApiError::Internal("session lock poisoned".into()))?;
    if let Some(name) = patient_name {
        session.patient_name = Some(name);
    }

    let conn = state.open_db()?;
    let flow = AppointmentFlow::new(&conn, state.intent.as_ref(), state.config.slot_mode);

    if !session.state.is_idle() {
        let answer = flow.advance(&mut session, question);
        return Ok(AskResponse {
            question: question.to_string(),
            answer,
            relevant_docs: Vec::new(),
            similarity_scores: Vec::new(),
            processing_time: 0.0,
            success: true,
            message: None,
            session_id: session_id.to_string(),
            flow_state: session.state.name(),
        });
    }

    let outcome = ask_question(
        &state.engine,
        state.generator.as_ref(),
        question,
        top_k,
        threshold,
    )?;
    let mut answer = outcome.answer;
    if let Some(prompt) = flow.try_start(&mut session, question, &answer) {
        answer = format!("{answer}\n\n{prompt}");
    }

    let success = outcome.generation_error.is_none();
    Ok(AskResponse {
        question: question.to_string(),
        answer,
        relevant_docs: outcome.documents,
        similarity_scores: outcome.scores,
        processing_time: outcome.elapsed_secs,
        success,
        message: outcome.generation_error,
        session_id: session_id.to_string(),
        flow_state: session.state.name(),
    })
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub top_k: Option<usize>,
    pub similarity_threshold: Option<f32>,
}

#[derive(Serialize)]
pub struct SearchParameters {
    pub top_k: usize,
    pub similarity_threshold: f32,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<RetrievedDoc>,
    pub similarity_scores: Vec<f32>,
    pub count: usize,
    pub parameters: SearchParameters,
}

/// `GET /search/:query` — similarity search without generation.
pub async fn search(
    State(ctx): State<ApiContext>,
    Path(query): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let top_k = params.top_k.unwrap_or(ctx.state.config.default_top_k);
    let threshold = params
        .similarity_threshold
        .unwrap_or(ctx.state.config.default_threshold);

    let state = ctx.state.clone();
    let q = query.clone();
    let (results, scores) =
        tokio::task::spawn_blocking(move || state.engine.search_similar(&q, top_k, threshold))
            .await
            .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))??;

    Ok(Json(SearchResponse {
        query,
        count: results.len(),
        results,
        similarity_scores: scores,
        parameters: SearchParameters {
            top_k,
            similarity_threshold: threshold,
        },
    }))
}

#[derive(Serialize)]
pub struct CacheClearResponse {
    pub message: &'static str,
    pub deleted_files: Vec<String>,
    pub note: &'static str,
}

/// `DELETE /cache` — remove the cache artifacts; the index stays in memory
/// until restart, which is when the rebuild happens.
pub async fn clear_cache(State(ctx): State<ApiContext>) -> Result<Json<CacheClearResponse>, ApiError> {
    let deleted_files = ctx.state.engine.clear_cache()?;
    tracing::info!(count = deleted_files.len(), "cache artifacts deleted");

    Ok(Json(CacheClearResponse {
        message: "Cache temizlendi",
        deleted_files,
        note: "Yeni embeddings oluşturmak için uygulamayı yeniden başlatın",
    }))
}
