use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::prediction::{Prediction, count_matching, parse_predictions};

pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/detr-resnet-50";

// -- config

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceArgs {
    /// Absolute URL of the hosted model
    pub endpoint: String,

    /// Bearer token sent in the `Authorization` header
    pub token: String,

    /// Request timeout in seconds (unbounded if absent)
    pub timeout_secs: Option<u64>,

    /// Extra attempts after a transport failure (or a 503 when `check_status` is set)
    pub retries: usize,

    /// Pause between attempts
    pub retry_backoff_ms: u64,

    /// Reject non-2xx responses instead of decoding them as predictions
    pub check_status: bool,

    /// Optional `Content-Type` for the uploaded bytes
    pub content_type: Option<String>,
}

impl Default for InferenceArgs {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            timeout_secs: None,
            retries: 0,
            retry_backoff_ms: 1000,
            check_status: false,
            content_type: None,
        }
    }
}

impl InferenceArgs {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            ..Default::default()
        }
    }
}

// -- client

/// Blocking client for a hosted inference endpoint.
///
/// Every call to [`InferenceClient::infer`] issues a fresh POST; nothing is cached between
/// calls.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    args: InferenceArgs,
}

impl InferenceClient {
    /// # Errors
    ///
    /// Returns `AppError::Config` if the endpoint or token is empty, and
    /// `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(args: InferenceArgs) -> Result<Self> {
        if args.endpoint.trim().is_empty() {
            return Err(AppError::Config("inference endpoint is empty".to_string()));
        }
        if args.token.is_empty() {
            return Err(AppError::Config("API token is empty".to_string()));
        }

        // reqwest's blocking client defaults to 30s; `None` really means no timeout here.
        let http = Client::builder()
            .timeout(args.timeout_secs.map(Duration::from_secs))
            .build()?;

        Ok(Self { http, args })
    }

    /// Upload the file at `file_path` and return the decoded JSON response as-is.
    ///
    /// The file is read before any network activity, so a missing file never
    /// reaches the service.
    pub fn infer(&self, file_path: &Path) -> Result<Value> {
        let data = std::fs::read(file_path)?;
        tracing::debug!("Read {} bytes from {:?}", data.len(), file_path);
        self.infer_bytes(data)
    }

    /// Upload raw bytes and return the decoded JSON response.
    ///
    /// Without `check_status` the HTTP status is ignored, so an error body such as
    /// `{"error": "..."}` comes back as an ordinary value.
    pub fn infer_bytes(&self, data: Vec<u8>) -> Result<Value> {
        let (status, body) = self.post_with_retry(&data)?;

        if !status.is_success() {
            if self.args.check_status {
                return Err(service_error(status, &body));
            }
            tracing::warn!("Inference service answered {}, decoding body anyway", status);
        }

        let text = std::str::from_utf8(&body)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Typed variant of [`InferenceClient::infer`] that validates the response shape.
    pub fn predict(&self, file_path: &Path) -> Result<Vec<Prediction>> {
        parse_predictions(self.infer(file_path)?)
    }

    /// Run inference on `file_path` and count the records labeled `label`.
    pub fn count_label(&self, file_path: &Path, label: &str) -> Result<usize> {
        let value = self.infer(file_path)?;
        count_matching(&value, label)
    }

    fn post_with_retry(&self, data: &[u8]) -> Result<(StatusCode, Vec<u8>)> {
        let mut attempt = 0;
        loop {
            let outcome = self.post_once(data);
            let retryable = match &outcome {
                Err(AppError::Transport(_)) => true,
                Ok((status, _)) => {
                    self.args.check_status && *status == StatusCode::SERVICE_UNAVAILABLE
                }
                Err(_) => false,
            };
            if !retryable || attempt >= self.args.retries {
                return outcome;
            }

            attempt += 1;
            tracing::warn!(
                "Inference request failed, retrying ({}/{})",
                attempt,
                self.args.retries
            );
            std::thread::sleep(Duration::from_millis(self.args.retry_backoff_ms));
        }
    }

    fn post_once(&self, data: &[u8]) -> Result<(StatusCode, Vec<u8>)> {
        let mut request = self
            .http
            .post(&self.args.endpoint)
            .bearer_auth(&self.args.token)
            .body(data.to_vec());
        if let Some(ref content_type) = self.args.content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        tracing::debug!("POST {} ({} bytes)", self.args.endpoint, data.len());
        let response = request.send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        tracing::debug!("Response {} ({} bytes)", status, body.len());

        Ok((status, body))
    }
}

fn service_error(status: StatusCode, body: &[u8]) -> AppError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    AppError::Service {
        status: Some(status.as_u16()),
        message,
    }
}

// -- public API

/// Send the file at `file_path` to `endpoint_url` and return the decoded response.
pub fn infer(file_path: impl AsRef<Path>, endpoint_url: &str, token: &str) -> Result<Value> {
    InferenceClient::new(InferenceArgs::new(endpoint_url, token))?.infer(file_path.as_ref())
}

/// Run inference (one fresh request) and count records whose `label` equals
/// `target_label` exactly.
pub fn count_label(
    file_path: impl AsRef<Path>,
    endpoint_url: &str,
    token: &str,
    target_label: &str,
) -> Result<usize> {
    InferenceClient::new(InferenceArgs::new(endpoint_url, token))?
        .count_label(file_path.as_ref(), target_label)
}

// -- tests
