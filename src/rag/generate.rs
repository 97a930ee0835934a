//! External text-generation backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RagError;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_ATTEMPTS: u32 = 3;

/// An opaque, possibly slow, possibly failing completion call.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, RagError> {
        (**self).generate(prompt)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Completion via a local Ollama instance.
///
/// The request carries a hard timeout, and transport failures are retried a
/// bounded number of times with a growing delay. HTTP error statuses are not
/// retried; a model that rejects the request once will reject it again.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn call_once(&self, prompt: &str) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                RagError::OllamaConnection(self.base_url.clone())
            } else if e.is_timeout() {
                RagError::HttpClient(format!("request timed out after {}s", self.timeout_secs))
            } else {
                RagError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::OllamaStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| RagError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

impl TextGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let mut attempt = 1;
        loop {
            match self.call_once(prompt) {
                Ok(text) => return Ok(text),
                Err(e @ (RagError::OllamaConnection(_) | RagError::HttpClient(_)))
                    if attempt < MAX_ATTEMPTS =>
                {
                    tracing::warn!(attempt, error = %e, "generation attempt failed, retrying");
                    std::thread::sleep(RETRY_BASE_DELAY * attempt);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Test generator with a fixed reply or a fixed failure.
pub struct MockGenerator {
    response: String,
    fail_with: Option<String>,
}

impl MockGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: String::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, RagError> {
        match &self.fail_with {
            Some(message) => Err(RagError::OllamaConnection(message.clone())),
            None => Ok(self.response.clone()),
        }
    }
}
