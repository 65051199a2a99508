use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::{
    config::KidemiaApiConfig,
    metrics,
    models::{
        question::QuestionCreate,
        topic::{Topic, TopicPage},
    },
    services::error_parser::api_error_message,
};

const BULK_QUESTIONS_PATH: &str = "/api/v1/questions/bulk-questions";

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Kidemia API is unreachable: {0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response from Kidemia API: {0}")]
    Decode(String),
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Joins `segments` into an upstream path, percent-encoding each one.
///
/// Empty and dot segments are refused so an identifier can never address
/// a different upstream resource.
pub fn api_path(segments: &[&str]) -> Result<String, UpstreamError> {
    let mut path = String::new();
    for segment in segments {
        if segment.is_empty() || *segment == "." || *segment == ".." {
            return Err(UpstreamError::InvalidIdentifier(segment.to_string()));
        }
        path.push('/');
        path.extend(utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET));
    }
    Ok(path)
}

/// The upstream Kidemia REST API, as far as this service needs it.
#[async_trait]
pub trait KidemiaBackend: Send + Sync {
    /// `POST /api/v1/questions/bulk-questions`
    async fn create_bulk_questions(&self, payload: &[QuestionCreate])
        -> Result<Value, UpstreamError>;

    /// `GET /api/v1/topics/subject/{subject_id}`
    async fn topics_by_subject(&self, subject_id: &str) -> Result<Vec<Topic>, UpstreamError>;

    /// Generic JSON call used by the catalog forms.
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, UpstreamError>;
}

pub struct HttpKidemiaBackend {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpKidemiaBackend {
    pub fn new(config: &KidemiaApiConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn call(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = self.finish(request.send().await).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(UpstreamError::Status { .. }) => "rejected",
            Err(_) => "failed",
        };
        metrics::UPSTREAM_REQUEST_DURATION_SECONDS
            .with_label_values(&[operation, outcome])
            .observe(started.elapsed().as_secs_f64());

        if let Err(err) = &result {
            tracing::warn!("Kidemia API {} {} failed: {}", method, path, err);
        }

        result
    }

    async fn finish(
        &self,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Value, UpstreamError> {
        let response = sent.map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: api_error_message(status.as_u16(), &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl KidemiaBackend for HttpKidemiaBackend {
    async fn create_bulk_questions(
        &self,
        payload: &[QuestionCreate],
    ) -> Result<Value, UpstreamError> {
        let body =
            serde_json::to_value(payload).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        self.call(
            "create_bulk_questions",
            Method::POST,
            BULK_QUESTIONS_PATH,
            Some(&body),
        )
        .await
    }

    async fn topics_by_subject(&self, subject_id: &str) -> Result<Vec<Topic>, UpstreamError> {
        let path = api_path(&["api", "v1", "topics", "subject", subject_id])?;
        let value = self
            .call("topics_by_subject", Method::GET, &path, None)
            .await?;
        let page: TopicPage =
            serde_json::from_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(page.items)
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, UpstreamError> {
        self.call("catalog", method, path, body.as_ref()).await
    }
}
