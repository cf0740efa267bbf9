//! In-process page-service stub for HTTP tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::{Path, State},
    http::{
        HeaderMap, HeaderName, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::post,
};
use serde_json::Value;

use crate::{ClientConfig, ControlClient, Credentials};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub service: String,
    pub method: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

struct StubState {
    responses: HashMap<String, (StatusCode, String)>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubServer {
    /// Serve canned `(status, body)` responses keyed by method name.
    pub async fn spawn(responses: &[(&str, StatusCode, &str)]) -> Self {
        let state = Arc::new(StubState {
            responses: responses
                .iter()
                .map(|(m, s, b)| ((*m).to_string(), (*s, (*b).to_string())))
                .collect(),
            requests: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/Services/{service}/{method}", post(handle))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn client(&self) -> ControlClient {
        ControlClient::new(ClientConfig::new(
            self.base_url.clone(),
            Credentials::new("svc", "secret"),
        ))
        .unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    Path((service, method)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(Recorded {
        service,
        method: method.clone(),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    state.responses.get(&method).cloned().unwrap_or((
        StatusCode::NOT_FOUND,
        r#"{"message":"Unknown method"}"#.to_string(),
    ))
}
