//! Ollama-compatible language model client
//!
//! Talks to `POST {url}/api/generate` with streaming disabled. The server
//! location comes from `OLLAMA_URL` when set, the configuration otherwise.

use super::build_http_client;
use crate::config::ModelConfig;
use echoverse_core::{GenerationRequest, LanguageModel, ModelError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "granite3.3:2b";
pub const URL_ENV: &str = "OLLAMA_URL";

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: usize,
    temperature: f32,
    /// Context window; longer prompts are truncated by the server
    num_ctx: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Client for an Ollama-compatible server
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaModel {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let base_url = std::env::var(URL_ENV).unwrap_or_else(|_| config.url.clone());
        let client = build_http_client(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.timeout_secs),
        )
        .map_err(|e| ModelError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Confirm the server answers and has the configured model pulled
    pub fn check_available(&self) -> Result<(), ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ModelError::Unavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), &detail));
        }

        let tags: TagsReply = response
            .json()
            .map_err(|e| ModelError::Unavailable(format!("{url}: {e}")))?;

        let names: Vec<&str> = tags.models.iter().map(|m| m.name.as_str()).collect();
        if model_listed(&names, &self.model) {
            Ok(())
        } else {
            Err(ModelError::Unavailable(format!(
                "model '{}' is not available on {}",
                self.model, self.base_url
            )))
        }
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> GenerateBody<'a> {
        GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: request.max_new_tokens,
                temperature: if request.sampling { request.temperature } else { 0.0 },
                num_ctx: request.max_prompt_tokens + request.max_new_tokens,
            },
        }
    }
}

impl LanguageModel for OllamaModel {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);
        log::debug!(
            "POST {} ({} prompt chars, {} tokens)",
            url,
            request.prompt.len(),
            request.max_new_tokens
        );

        let response = self
            .client
            .post(&url)
            .json(&self.body(request))
            .send()
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), &detail));
        }

        let reply: GenerateReply = response
            .json()
            .map_err(|e| ModelError::Generation(format!("malformed reply: {e}")))?;
        Ok(reply.response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn send_error(e: reqwest::Error) -> ModelError {
    if e.is_connect() || e.is_timeout() {
        ModelError::Unavailable(e.to_string())
    } else {
        ModelError::Generation(e.to_string())
    }
}

fn status_error(status: u16, detail: &str) -> ModelError {
    if detail.to_lowercase().contains("memory") {
        ModelError::ResourceExhausted(detail.trim().to_string())
    } else if status == 404 {
        ModelError::Unavailable(format!("HTTP 404: {}", detail.trim()))
    } else {
        ModelError::Generation(format!("HTTP {status}: {}", detail.trim()))
    }
}

/// Server tags carry an explicit `:latest` when the model was pulled without one
fn model_listed(names: &[&str], model: &str) -> bool {
    names
        .iter()
        .any(|name| *name == model || name.strip_suffix(":latest") == Some(model))
}
