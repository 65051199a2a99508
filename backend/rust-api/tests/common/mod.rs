#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use kidemia_admin_api::{
    config::Config,
    create_router,
    models::{question::QuestionCreate, topic::Topic},
    services::{
        kidemia_client::{KidemiaBackend, UpstreamError},
        AppState,
    },
};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tower::ServiceExt;

/// In-memory stand-in for the Kidemia API.
#[derive(Default)]
pub struct MockBackend {
    pub bulk_payloads: Mutex<Vec<Vec<QuestionCreate>>>,
    pub catalog_calls: Mutex<Vec<(Method, String, Option<Value>)>>,
    pub topics: Mutex<Vec<Topic>>,
    /// `(status, message)` returned by every call while set.
    pub failure: Mutex<Option<(u16, String)>>,
    /// When set, bulk calls wait for `release` before answering.
    pub hold: Mutex<bool>,
    pub entered: Notify,
    pub release: Notify,
}

impl MockBackend {
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn check_failure(&self) -> Result<(), UpstreamError> {
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(UpstreamError::Status { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KidemiaBackend for MockBackend {
    async fn create_bulk_questions(
        &self,
        payload: &[QuestionCreate],
    ) -> Result<Value, UpstreamError> {
        let hold = *self.hold.lock().unwrap();
        if hold {
            self.entered.notify_one();
            self.release.notified().await;
        }

        self.check_failure()?;
        self.bulk_payloads.lock().unwrap().push(payload.to_vec());
        Ok(json!({ "created": payload.len() }))
    }

    async fn topics_by_subject(&self, _subject_id: &str) -> Result<Vec<Topic>, UpstreamError> {
        self.check_failure()?;
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, UpstreamError> {
        self.check_failure()?;
        self.catalog_calls
            .lock()
            .unwrap()
            .push((method, path.to_string(), body.clone()));
        Ok(json!({ "id": "created-id", "echo": body }))
    }
}

pub fn create_test_app() -> (Router, Arc<MockBackend>) {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let backend = Arc::new(MockBackend::default());
    let state = Arc::new(AppState::with_backend(Config::default(), backend.clone()));
    (create_router(state), backend)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn send_csv(app: &Router, uri: &str, csv: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "text/csv")
                .body(Body::from(csv.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Opens a session and returns `(session_id, first_question_id)`.
pub async fn open_session(app: &Router) -> (String, String) {
    let response = send(
        app,
        "POST",
        "/api/v1/authoring/sessions",
        Some(json!({ "subject_id": "subject-1", "subject_title": "Physics" })),
    )
    .await;
    let session = json_body(response).await;
    (
        session["id"].as_str().unwrap().to_string(),
        session["questions"][0]["id"].as_str().unwrap().to_string(),
    )
}
