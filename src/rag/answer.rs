//! One question through the full retrieve-then-generate pipeline.

use std::time::Instant;

use super::engine::{RagEngine, RetrievedDoc};
use super::generate::TextGenerator;
use super::prompt::{build_context, build_prompt, NO_RESULTS_MESSAGE};
use super::RagError;

/// Outcome of one answered question. `generation_error` is set when the
/// completion call failed; `answer` then carries the embedded error text
/// instead of a model reply.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: String,
    pub documents: Vec<RetrievedDoc>,
    pub scores: Vec<f32>,
    pub elapsed_secs: f64,
    pub generation_error: Option<String>,
}

/// Answer a question with retrieval-backed generation.
///
/// Empty retrieval short-circuits to a canned message without touching the
/// generator. A failed generation call is folded into the answer text, so
/// the caller always gets something user-displayable back.
pub fn ask_question(
    engine: &RagEngine,
    generator: &dyn TextGenerator,
    question: &str,
    top_k: usize,
    threshold: f32,
) -> Result<AskOutcome, RagError> {
    let started = Instant::now();

    let (documents, scores) = engine.search_similar(question, top_k, threshold)?;

    if documents.is_empty() {
        return Ok(AskOutcome {
            answer: NO_RESULTS_MESSAGE.to_string(),
            documents,
            scores,
            elapsed_secs: started.elapsed().as_secs_f64(),
            generation_error: None,
        });
    }

    let context = build_context(&documents, &scores);
    let prompt = build_prompt(question, &context);

    let (answer, generation_error) = match generator.generate(&prompt) {
        Ok(text) => (text, None),
        Err(e) => {
            tracing::error!(error = %e, "text generation failed");
            (
                format!("AI yanıt oluşturma hatası: {e}"),
                Some(e.to_string()),
            )
        }
    };

    Ok(AskOutcome {
        answer,
        documents,
        scores,
        elapsed_secs: started.elapsed().as_secs_f64(),
        generation_error,
    })
}
