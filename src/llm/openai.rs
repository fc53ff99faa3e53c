use serde::{Deserialize, Serialize};

use super::{chat_endpoint, non_empty, read_json, LlmError, Message, Sampling};

const PROVIDER: &str = "OpenAI";
const EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of `choices[0].message.content`.
    pub fn into_content(self, provider: &'static str) -> Result<String, LlmError> {
        let choice = self.choices.into_iter().next().ok_or(LlmError::Malformed {
            provider,
            detail: "response has no choices".to_string(),
        })?;
        non_empty(provider, choice.message.content.unwrap_or_default())
    }
}

pub async fn chat(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    sampling: Sampling,
) -> Result<String, LlmError> {
    let body = ChatRequest {
        model,
        messages: vec![Message::user(prompt)],
        max_tokens: sampling.max_tokens,
        temperature: sampling.temperature,
    };

    let resp = http
        .post(chat_endpoint(base_url))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|source| LlmError::Request {
            provider: PROVIDER,
            source,
        })?;

    read_json::<ChatResponse>(PROVIDER, resp)
        .await?
        .into_content(PROVIDER)
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub async fn embed(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>, LlmError> {
    let url = format!("{}/v1/embeddings", base_url.trim_end_matches('/'));
    let resp = http
        .post(url)
        .bearer_auth(api_key)
        .json(&EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: texts,
        })
        .send()
        .await
        .map_err(|source| LlmError::Request {
            provider: PROVIDER,
            source,
        })?;

    let mut parsed: EmbeddingResponse = read_json(PROVIDER, resp).await?;
    if parsed.data.len() != texts.len() {
        return Err(LlmError::Malformed {
            provider: PROVIDER,
            detail: format!("expected {} embeddings, got {}", texts.len(), parsed.data.len()),
        });
    }

    parsed.data.sort_by_key(|d| d.index);
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}
