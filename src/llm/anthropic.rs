use serde::{Deserialize, Serialize};

use super::{non_empty, read_json, LlmError, Message};

const PROVIDER: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub async fn messages(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, LlmError> {
    let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
    let resp = http
        .post(url)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .json(&MessagesRequest {
            model,
            max_tokens: 1000,
            messages: vec![Message::user(prompt)],
        })
        .send()
        .await
        .map_err(|source| LlmError::Request {
            provider: PROVIDER,
            source,
        })?;

    let parsed: MessagesResponse = read_json(PROVIDER, resp).await?;
    let first = parsed.content.into_iter().next().ok_or(LlmError::Malformed {
        provider: PROVIDER,
        detail: "response has no content blocks".to_string(),
    })?;
    non_empty(PROVIDER, first.text.unwrap_or_default())
}
