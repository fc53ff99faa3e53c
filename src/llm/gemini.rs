use serde::{Deserialize, Serialize};

use super::{non_empty, read_json, LlmError};

const PROVIDER: &str = "Google";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

pub async fn generate(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, LlmError> {
    let url = format!(
        "{}/v1beta/models/{}:generateContent?key={}",
        base_url.trim_end_matches('/'),
        model,
        api_key
    );
    let resp = http
        .post(url)
        .json(&GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        })
        .send()
        .await
        .map_err(|source| LlmError::Request {
            provider: PROVIDER,
            // the URL carries the API key
            source: source.without_url(),
        })?;

    let parsed: GenerateResponse = read_json(PROVIDER, resp).await?;
    let candidate = parsed.candidates.into_iter().next().ok_or(LlmError::Malformed {
        provider: PROVIDER,
        detail: "response has no candidates".to_string(),
    })?;

    // candidates[0].content.parts[*].text
    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    non_empty(PROVIDER, text)
}
