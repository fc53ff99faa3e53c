pub mod anthropic;
pub mod gemini;
pub mod local;
pub mod openai;

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ApiKeys, Endpoints, Settings};
use crate::models::{ModelId, Provider};

/// Dimensionality of `text-embedding-3-small`; failed embeddings become zero
/// vectors of this length.
pub const EMBEDDING_DIM: usize = 1536;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generation limits for an OpenAI chat call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Sampling {
    /// First-pass answers.
    pub const ANSWER: Sampling = Sampling {
        max_tokens: 500,
        temperature: 0.7,
    };
    /// Rewrites of a weak answer: a little longer and more conservative.
    pub const IMPROVE: Sampling = Sampling {
        max_tokens: 600,
        temperature: 0.5,
    };
}

/// Failure of one upstream model call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} API key is not configured")]
    MissingKey { provider: &'static str },

    #[error("{provider} server is not reachable at {url}")]
    Unavailable { provider: &'static str, url: String },

    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response was malformed: {detail}")]
    Malformed { provider: &'static str, detail: String },

    #[error("{provider} returned an empty answer")]
    Empty { provider: &'static str },
}

impl LlmError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Request { source, .. } if source.is_timeout())
    }

    /// Inline text shown in place of an answer.
    pub fn render(&self) -> String {
        if self.is_timeout() {
            format!("⚠️ Error: request timed out ({self})")
        } else {
            format!("⚠️ Error: {self}")
        }
    }
}

/// Resolve the chat completions endpoint from an OpenAI-style base URL.
pub(crate) fn chat_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else if base.ends_with("/v1") {
        format!("{}/chat/completions", base)
    } else {
        format!("{}/v1/chat/completions", base)
    }
}

/// Read a response body, mapping non-2xx and undecodable JSON to [`LlmError`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<T, LlmError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|source| LlmError::Request {
            provider,
            source: source.without_url(),
        })?;

    if !status.is_success() {
        let body: String = text.chars().take(300).collect();
        return Err(LlmError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&text).map_err(|e| LlmError::Malformed {
        provider,
        detail: e.to_string(),
    })
}

pub(crate) fn non_empty(provider: &'static str, content: String) -> Result<String, LlmError> {
    if content.trim().is_empty() {
        Err(LlmError::Empty { provider })
    } else {
        Ok(content)
    }
}

/// One client for every upstream the assistant talks to.
pub struct LlmClient {
    http: reqwest::Client,
    keys: ApiKeys,
    endpoints: Endpoints,
    local_retry_delay: Duration,
    local_max_retries: u32,
}

impl LlmClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.llm_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            keys: settings.keys.clone(),
            endpoints: settings.endpoints.clone(),
            local_retry_delay: settings.local_retry_delay,
            local_max_retries: local::MAX_RETRIES,
        })
    }

    pub fn with_local_retries(mut self, max_retries: u32, delay: Duration) -> Self {
        self.local_max_retries = max_retries.max(1);
        self.local_retry_delay = delay;
        self
    }

    /// Whether a call to `model` can be attempted at all.
    pub fn is_configured(&self, model: ModelId) -> bool {
        match model.provider() {
            Provider::Local => true,
            provider => self.keys.get(provider).is_some(),
        }
    }

    fn key(&self, provider: Provider) -> Result<&str, LlmError> {
        self.keys.get(provider).ok_or(LlmError::MissingKey {
            provider: provider.label(),
        })
    }

    /// Send `prompt` to `model` and return its answer text.
    pub async fn complete(&self, model: ModelId, prompt: &str) -> Result<String, LlmError> {
        self.complete_with(model, prompt, Sampling::ANSWER).await
    }

    /// Like [`complete`](Self::complete) with explicit limits. Only the
    /// OpenAI models take them; the other providers keep their own.
    pub async fn complete_with(
        &self,
        model: ModelId,
        prompt: &str,
        sampling: Sampling,
    ) -> Result<String, LlmError> {
        let upstream = model.descriptor().upstream;
        debug!(model = %model, prompt_len = prompt.len(), max_tokens = sampling.max_tokens, "model call");

        match model.provider() {
            Provider::OpenAi => {
                let key = self.key(Provider::OpenAi)?;
                openai::chat(&self.http, &self.endpoints.openai, key, upstream, prompt, sampling)
                    .await
            }
            Provider::Anthropic => {
                let key = self.key(Provider::Anthropic)?;
                anthropic::messages(&self.http, &self.endpoints.anthropic, key, upstream, prompt)
                    .await
            }
            Provider::Google => {
                let key = self.key(Provider::Google)?;
                gemini::generate(&self.http, &self.endpoints.gemini, key, upstream, prompt).await
            }
            Provider::Local => {
                local::chat_with_retry(
                    &self.http,
                    &self.endpoints.local,
                    upstream,
                    prompt,
                    self.local_max_retries,
                    self.local_retry_delay,
                )
                .await
            }
        }
    }

    pub async fn local_health(&self) -> bool {
        local::health(&self.http, &self.endpoints.local).await
    }

    /// Embed every text, batching like the hosted API prefers.
    ///
    /// Never fails: a failed batch is retried one text at a time, and a text
    /// that still fails gets a zero vector.
    pub async fn embed_texts(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let Some(key) = self.keys.openai.as_deref() else {
            warn!(count = texts.len(), "no OpenAI key; storing zero embeddings");
            return vec![vec![0.0; EMBEDDING_DIM]; texts.len()];
        };

        let batch_size = (texts.len() / 20).clamp(10, 50);
        let mut out = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            match openai::embed(&self.http, &self.endpoints.openai, key, &refs).await {
                Ok(vectors) => out.extend(vectors),
                Err(e) => {
                    warn!(batch = batch.len(), "embedding batch failed, retrying singly: {e}");
                    for &text in &refs {
                        let vector = openai::embed(&self.http, &self.endpoints.openai, key, &[text])
                            .await
                            .ok()
                            .and_then(|v| v.into_iter().next())
                            .unwrap_or_else(|| vec![0.0; EMBEDDING_DIM]);
                        out.push(vector);
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalization() {
        assert_eq!(chat_endpoint("http://localhost:8000"), "http://localhost:8000/v1/chat/completions");
        assert_eq!(chat_endpoint("http://localhost:8000/"), "http://localhost:8000/v1/chat/completions");
        assert_eq!(chat_endpoint("http://h/v1"), "http://h/v1/chat/completions");
        assert_eq!(chat_endpoint("http://h/v1/chat/completions"), "http://h/v1/chat/completions");
    }

    #[test]
    fn rendered_errors_are_recognizable() {
        let err = LlmError::MissingKey { provider: "OpenAI" };
        assert_eq!(err.render(), "⚠️ Error: OpenAI API key is not configured");

        let err = LlmError::Status {
            provider: "Anthropic",
            status: 529,
            body: "overloaded".into(),
        };
        assert!(err.render().contains("HTTP 529"));
    }

    #[test]
    fn local_models_are_always_attemptable() {
        let client = LlmClient::new(&Settings::default()).unwrap();
        assert!(client.is_configured(ModelId::GptOss20b));
        assert!(!client.is_configured(ModelId::Gpt4o));
        assert!(!client.is_configured(ModelId::GeminiPro));
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let client = LlmClient::new(&Settings::default()).unwrap();
        let err = client.complete(ModelId::Claude35Sonnet, "hi").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingKey { provider: "Anthropic" }));
    }

    #[tokio::test]
    async fn embeddings_without_key_are_zero_vectors() {
        let client = LlmClient::new(&Settings::default()).unwrap();
        let vectors = client.embed_texts(&["a".to_string(), "b".to_string()]).await;
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == EMBEDDING_DIM && v.iter().all(|x| *x == 0.0)));
    }
}
