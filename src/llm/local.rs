//! Locally hosted OpenAI-compatible server (GPT-OSS).

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::openai::ChatResponse;
use super::{chat_endpoint, read_json, LlmError, Message};

const PROVIDER: &str = "Local";
const SYSTEM_PROMPT: &str = "You are a helpful assistant. Provide clear and detailed answers.";

pub const MAX_RETRIES: u32 = 3;
/// Answers at or below this many characters count as a failed attempt.
pub const MIN_VALID_CHARS: usize = 20;

const CHAT_TIMEOUT: Duration = Duration::from_secs(60);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct LocalChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

/// `GET {base}/health` answered with 200 within five seconds.
pub async fn health(http: &reqwest::Client, base_url: &str) -> bool {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    match http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

pub async fn chat(
    http: &reqwest::Client,
    base_url: &str,
    model: &str,
    prompt: &str,
) -> Result<String, LlmError> {
    let body = LocalChatRequest {
        model,
        messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        max_tokens: 4096,
        temperature: 0.7,
        top_p: 0.9,
        frequency_penalty: 0.1,
        presence_penalty: 0.1,
    };

    let resp = http
        .post(chat_endpoint(base_url))
        .timeout(CHAT_TIMEOUT)
        .json(&body)
        .send()
        .await
        .map_err(|source| {
            if source.is_connect() {
                LlmError::Unavailable {
                    provider: PROVIDER,
                    url: base_url.to_string(),
                }
            } else {
                LlmError::Request {
                    provider: PROVIDER,
                    source,
                }
            }
        })?;

    read_json::<ChatResponse>(PROVIDER, resp)
        .await?
        .into_content(PROVIDER)
}

/// Call the local server up to `max_retries` times, sleeping `delay` between
/// attempts, until it returns an answer longer than [`MIN_VALID_CHARS`].
pub async fn chat_with_retry(
    http: &reqwest::Client,
    base_url: &str,
    model: &str,
    prompt: &str,
    max_retries: u32,
    delay: Duration,
) -> Result<String, LlmError> {
    let mut last_err = None;

    for attempt in 1..=max_retries {
        match chat(http, base_url, model, prompt).await {
            Ok(content) if content.trim().chars().count() > MIN_VALID_CHARS => {
                if attempt > 1 {
                    info!(attempt, model, "local model answered after retry");
                }
                return Ok(content);
            }
            Ok(content) => {
                warn!(attempt, model, len = content.len(), "local model answer too short");
                last_err = Some(LlmError::Empty { provider: PROVIDER });
            }
            Err(e) => {
                warn!(attempt, model, "local model call failed: {e}");
                last_err = Some(e);
            }
        }

        if attempt < max_retries {
            tokio::time::sleep(delay).await;
        }
    }

    Err(last_err.unwrap_or(LlmError::Empty { provider: PROVIDER }))
}
