//! Ollama HTTP client for embeddings and completions
//!
//! Both endpoints go through [`OllamaClient::post_json`], which retries with
//! exponential backoff and reports connection failures as
//! `Error::BackendUnavailable`.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::retry::retry_request;

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: CompletionOptions,
}

#[derive(Serialize)]
struct CompletionOptions {
    temperature: f32,
    num_ctx: usize,
}

#[derive(Deserialize)]
struct CompletionResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Which error family a failed call belongs to
#[derive(Clone, Copy)]
enum Endpoint {
    Embeddings,
    Generate,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Embeddings => "/api/embeddings",
            Endpoint::Generate => "/api/generate",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Endpoint::Embeddings => "Ollama embedding",
            Endpoint::Generate => "Ollama generation",
        }
    }

    fn error(self, message: String) -> Error {
        match self {
            Endpoint::Embeddings => Error::embedding(message),
            Endpoint::Generate => Error::llm(message),
        }
    }
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Whether the server answers `/api/tags`
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);
        Ok(self
            .client
            .get(&url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false))
    }

    /// Embed one text with the configured embedding model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            prompt: text,
        };
        let response: EmbeddingResponse = self.post_json(Endpoint::Embeddings, &request).await?;
        Ok(response.embedding)
    }

    /// Complete a fully rendered prompt with the configured generation model
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Generating with {} ({} prompt chars)",
            self.config.generate_model,
            prompt.chars().count()
        );

        let request = CompletionRequest {
            model: &self.config.generate_model,
            prompt,
            stream: false,
            options: CompletionOptions {
                temperature: self.config.temperature,
                num_ctx: self.config.context_size,
            },
        };
        let response: CompletionResponse = self.post_json(Endpoint::Generate, &request).await?;
        Ok(response.response)
    }

    async fn post_json<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, endpoint.path());
        let (url, client) = (url.as_str(), &self.client);

        retry_request(endpoint.label(), self.config.max_retries, move || async move {
            let response = client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        Error::backend_unavailable("ollama", e.to_string())
                    } else {
                        endpoint.error(format!("Request failed: {}", e))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(endpoint.error(format!("HTTP {} - {}", status, body)));
            }

            response
                .json::<R>()
                .await
                .map_err(|e| endpoint.error(format!("Failed to parse response: {}", e)))
        })
        .await
    }
}
