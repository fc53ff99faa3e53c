use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router};
use pdf_assistant::config::{ApiKeys, Endpoints, Settings};
use pdf_assistant::llm::LlmClient;
use pdf_assistant::{app_router, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};

const STUB_ANSWER: &str = "첫째, 정의를 설명하면 다음과 같습니다. 예를 들어 구체적으로 살펴보면 또한 따라서 결론이 나옵니다.";

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    format!("http://{}", addr)
}

/// The assistant wired to a stub OpenAI-compatible upstream.
async fn spawn_server() -> String {
    let upstream = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({ "choices": [{ "message": { "content": STUB_ANSWER } }] })) }),
    );
    let upstream = spawn(upstream).await;

    let settings = Settings {
        keys: ApiKeys {
            openai: Some("sk-test".into()),
            ..ApiKeys::default()
        },
        endpoints: Endpoints::all(&upstream),
        max_upload_bytes: 1024 * 1024,
        ..Settings::default()
    };
    let llm = LlmClient::new(&settings)
        .expect("client")
        .with_local_retries(1, Duration::from_millis(1));
    let state = AppState::with_client(llm, &settings).expect("state");
    spawn(app_router(state)).await
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let resp = client
        .post(format!("{}/api/sessions", base))
        .send()
        .await
        .expect("create session");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("session json");
    body["session_id"].as_str().expect("session_id field").to_string()
}

#[tokio::test]
async fn health_and_models() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let models: Vec<Value> = client
        .get(format!("{}/api/models", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(models.len(), 7);
    let available = |id: &str| {
        models
            .iter()
            .find(|m| m["id"] == id)
            .and_then(|m| m["available"].as_bool())
    };
    assert_eq!(available("gpt-4o"), Some(true));
    assert_eq!(available("claude-3-5-sonnet"), Some(false));
    assert_eq!(available("gpt-oss-20b"), Some(true));

    let page = client.get(&base).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("/api/sessions"));
}

#[tokio::test]
async fn ask_flow_with_general_mode_history_and_reset() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let session = create_session(&client, &base).await;

    // no document and general mode off
    let resp = client
        .post(format!("{}/api/sessions/{}/ask", base, session))
        .json(&json!({ "question": "정의를 설명해주세요" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("upload a PDF"));

    let resp = client
        .put(format!("{}/api/sessions/{}/config", base, session))
        .json(&json!({ "general_mode": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let config: Value = resp.json().await.unwrap();
    assert_eq!(config["general_mode"], true);
    assert_eq!(config["chunk_size"], 200);

    let resp = client
        .post(format!("{}/api/sessions/{}/ask", base, session))
        .json(&json!({ "question": "정의를 설명해주세요" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let answer: Value = resp.json().await.unwrap();
    assert_eq!(answer["selection"]["model"], "gpt-3.5-turbo");
    assert_eq!(answer["answers"][0]["ok"], true);
    assert_eq!(answer["answers"][0]["text"], STUB_ANSWER);
    let score = answer["final_answer"]["quality"]["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));

    let resp = client
        .post(format!("{}/api/sessions/{}/ask", base, session))
        .json(&json!({ "question": "비교", "mode": "hierarchical" }))
        .send()
        .await
        .unwrap();
    let answer: Value = resp.json().await.unwrap();
    assert_eq!(answer["answers"].as_array().unwrap().len(), 2);
    assert_eq!(answer["answers"][1]["model"], "gpt-4o");
    assert!(answer["context"].as_str().unwrap().starts_with("사용자: 정의를 설명해주세요"));

    let history: Value = client
        .get(format!("{}/api/sessions/{}/history?limit=1", base, session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["entries"].as_array().unwrap().len(), 1);
    assert_eq!(history["entries"][0]["question"], "비교");
    assert_eq!(history["stats"]["total_questions"], 2);

    let resp = client
        .post(format!("{}/api/sessions/{}/reset", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats: Value = resp.json().await.unwrap();
    assert_eq!(stats["total_questions"], 0);

    // configuration survives a reset
    let config: Value = client
        .get(format!("{}/api/sessions/{}/config", base, session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config["general_mode"], true);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let session = create_session(&client, &base).await;

    let resp = client
        .put(format!("{}/api/sessions/{}/config", base, session))
        .json(&json!({ "chunk_size": 100, "overlap": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{}/api/sessions/{}/ask", base, session))
        .json(&json!({ "question": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{}/api/sessions/{}/documents?name=x.pdf", base, session))
        .body("this is not a pdf")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = client
        .post(format!("{}/api/sessions/{}/documents", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("{}/api/sessions/{}/documents/nope/search?q=rust", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(format!("{}/api/sessions/{}/documents/nope/activate", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let docs: Vec<Value> = client
        .get(format!("{}/api/sessions/{}/documents", base, session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn unknown_and_deleted_sessions_are_404() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/sessions/missing/history", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "session not found");

    let session = create_session(&client, &base).await;
    let resp = client
        .delete(format!("{}/api/sessions/{}", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{}/api/sessions/{}/config", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_pdf_feeds_search_and_answers() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let session = create_session(&client, &base).await;

    let resp = client
        .post(format!("{}/api/sessions/{}/documents?name=ownership.pdf", base, session))
        .body(include_bytes!("fixtures/ownership.pdf").to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let meta: Value = resp.json().await.unwrap();
    assert_eq!(meta["name"], "ownership.pdf");
    assert_eq!(meta["active"], true);
    assert!(meta["chunk_count"].as_u64().unwrap() > 0);
    let doc_id = meta["id"].as_str().unwrap().to_string();

    let docs: Vec<Value> = client
        .get(format!("{}/api/sessions/{}/documents", base, session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["id"], doc_id.as_str());

    let hits: Vec<Value> = client
        .get(format!(
            "{}/api/sessions/{}/documents/{}/search?q=ownership",
            base, session, doc_id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits[0]["content"].as_str().unwrap().contains("ownership"));

    // general mode stays off: the answer must be grounded in the PDF
    let resp = client
        .post(format!("{}/api/sessions/{}/ask", base, session))
        .json(&json!({ "question": "what does ownership mean" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let answer: Value = resp.json().await.unwrap();
    assert!(answer["context"].as_str().unwrap().contains("ownership"));
    assert_eq!(answer["answers"][0]["ok"], true);
}
