//! Request preparation and the HTTP session
//!
//! A [`PreparedRequest`] is a validated, transport-neutral description of
//! one call. The [`Dispatch`] trait sends it; [`HttpSession`] is the real
//! implementation, a single reqwest client whose cookie jar carries the
//! login session across every case in a run.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::{BodyType, CaseFailure, Method, TestCase};
use crate::checkpoint::render;
use crate::common::{Config, Error, Result};

/// Payload carried by a prepared request
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    /// Query-string parameters (GET)
    Query(Vec<(String, String)>),
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
    /// JSON document
    Json(Value),
    /// File sent as the multipart part named `file`
    Upload(PathBuf),
}

/// A validated request, ready to dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: String,
    pub method: Method,
    pub body_type: BodyType,
    pub headers: Vec<(String, String)>,
    pub payload: Payload,
}

impl PreparedRequest {
    /// Validate the case's body type, then its method, and build the request
    pub fn prepare(
        case: &TestCase,
        body: Option<&Map<String, Value>>,
        user_agent: &str,
    ) -> std::result::Result<Self, CaseFailure> {
        let body_type = BodyType::parse(&case.body_type)
            .ok_or_else(|| CaseFailure::InvalidBodyType(case.body_type.clone()))?;
        let method = Method::parse(&case.method)
            .ok_or_else(|| CaseFailure::InvalidMethod(case.method.clone()))?;

        let mut headers = vec![
            ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
            ("Connection".to_string(), "keep-alive".to_string()),
            ("User-Agent".to_string(), user_agent.to_string()),
        ];
        if let Some(content_type) = body_type.content_type() {
            headers.push(("Content-Type".to_string(), content_type));
        }

        let payload = match (method, body_type) {
            (Method::Get, _) => body.map_or(Payload::None, |map| Payload::Query(pairs(map))),
            (Method::Post, BodyType::UrlEncoded) => {
                body.map_or(Payload::None, |map| Payload::Form(pairs(map)))
            }
            (Method::Post, BodyType::Json) => {
                body.map_or(Payload::None, |map| Payload::Json(Value::Object(map.clone())))
            }
            (Method::Post, BodyType::Multipart) => {
                Payload::Upload(PathBuf::from(case.upload_file.trim()))
            }
        };

        Ok(Self {
            url: case.url(),
            method,
            body_type,
            headers,
            payload,
        })
    }
}

/// Flatten a body mapping into form/query pairs
///
/// Null values are left out and list values repeat the key once per item.
fn pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    out.push((key.clone(), render(item)));
                }
            }
            other => out.push((key.clone(), render(other))),
        }
    }
    out
}

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A request that did not produce a response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The server could not be reached; worth retrying
    #[error("{0}")]
    Connection(String),

    /// Anything else: timeouts, protocol errors, unreadable upload files
    #[error("{0}")]
    Transport(String),
}

impl From<DispatchError> for CaseFailure {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Connection(reason) => CaseFailure::Connection(reason),
            DispatchError::Transport(reason) => CaseFailure::Transport(reason),
        }
    }
}

/// Sends prepared requests over a shared session
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn send(&self, request: &PreparedRequest)
        -> std::result::Result<RawResponse, DispatchError>;
}

/// HTTP session backed by one reqwest client with a cookie store
pub struct HttpSession {
    client: reqwest::Client,
}

impl HttpSession {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(config.request_timeout())
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Session(e.to_string()))?;
        Ok(Self { client })
    }
}

fn classify(e: reqwest::Error) -> DispatchError {
    if e.is_connect() {
        DispatchError::Connection(e.to_string())
    } else {
        DispatchError::Transport(e.to_string())
    }
}

async fn upload_form(path: &Path) -> std::result::Result<reqwest::multipart::Form, DispatchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DispatchError::Transport(format!("{}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
    Ok(reqwest::multipart::Form::new().part("file", part))
}

#[async_trait]
impl Dispatch for HttpSession {
    async fn send(
        &self,
        request: &PreparedRequest,
    ) -> std::result::Result<RawResponse, DispatchError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.payload {
            Payload::None => builder,
            Payload::Query(params) => builder.query(params),
            Payload::Form(fields) => builder.form(fields),
            // Serialized by hand so the configured Content-Type is kept
            Payload::Json(value) => builder.body(value.to_string()),
            Payload::Upload(path) => builder.multipart(upload_form(path).await?),
        };

        tracing::debug!("{} {}", request.method, request.url);
        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        Ok(RawResponse::new(status, body.to_vec()))
    }
}
