// src/test_utils/mock_llm_server.rs
use axum::http::HeaderMap;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core_types::LLMResponse;
use crate::errors::PipelineError;

#[derive(Clone)]
struct MockServerState {
    responses: Arc<Mutex<VecDeque<Result<LLMResponse, PipelineError>>>>,
    requests: Arc<Mutex<Vec<Value>>>,
    authorization: Arc<Mutex<Vec<String>>>,
}

impl MockServerState {
    fn new(responses: Vec<Result<LLMResponse, PipelineError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
            authorization: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Render an [`LLMResponse`] the way the OpenAI API would.
fn to_openai_body(response: &LLMResponse) -> Value {
    let choices: Vec<Value> = response
        .choices
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            json!({
                "index": index,
                "message": {"role": "assistant", "content": choice.content},
                "finish_reason": choice.finish_reason,
            })
        })
        .collect();
    json!({ "id": "chatcmpl-mock", "object": "chat.completion", "choices": choices })
}

async fn chat_completions_handler(
    axum::extract::State(state): axum::extract::State<MockServerState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, axum::http::StatusCode> {
    log::debug!("Mock LLM server received request: {}", payload);
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorization.lock().unwrap().push(auth.to_string());
    }
    state.requests.lock().unwrap().push(payload);

    match state.responses.lock().unwrap().pop_front() {
        Some(Ok(resp)) => Ok(Json(to_openai_body(&resp))),
        Some(Err(e)) => {
            log::error!("Mock LLM server simulating an error: {:?}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
        None => {
            log::error!("Mock LLM server ran out of responses!");
            Err(axum::http::StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

pub struct MockLLMServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    recorded_requests: Arc<Mutex<Vec<Value>>>,
    recorded_authorization: Arc<Mutex<Vec<String>>>,
}

impl MockLLMServer {
    pub async fn start(responses: Vec<Result<LLMResponse, PipelineError>>) -> Self {
        let state = MockServerState::new(responses);
        let recorded_requests = state.requests.clone();
        let recorded_authorization = state.authorization.clone();

        let app = Router::new()
            .route("/chat/completions", post(chat_completions_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock LLM server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock LLM server error: {}", e);
                });
        });

        MockLLMServer {
            addr,
            shutdown_tx,
            recorded_requests,
            recorded_authorization,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock LLM server shutdown signal already sent or receiver dropped.");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    pub fn get_requests(&self) -> Vec<Value> {
        self.recorded_requests.lock().unwrap().clone()
    }

    pub fn authorization_headers(&self) -> Vec<String> {
        self.recorded_authorization.lock().unwrap().clone()
    }
}
