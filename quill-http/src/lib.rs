//! Outbound JSON client used for completion calls.
//!
//! One request per call: there is no retry loop, so a failed upstream call
//! surfaces immediately as an [`HttpError`]. The bearer token is never
//! logged. Set `QUILL_HTTP_RAW=1` to log raw response bodies (truncated).
//!
//! ```no_run
//! # async fn demo() -> Result<(), quill_http::HttpError> {
//! let client = quill_http::HttpClient::new("https://api.example.com/v1")?;
//! let got: serde_json::Value = client
//!     .post_json("items", Some("token"), &serde_json::json!({"q": 1}))
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "QUILL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

static CALL_SEQ: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    /// 401 and 403 both mean the credential was refused.
    pub fn is_auth(&self) -> bool {
        self.status()
            .is_some_and(|s| s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
    }

    fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Anchor a client to `base`. A trailing `/` is added so relative paths
    /// extend the base instead of replacing its last segment.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Whole-request deadline, connect included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// POST `body` as JSON to `path` and decode a JSON reply.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let payload = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;

        let mut rb = self
            .inner
            .post(url.clone())
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(token) = bearer {
            rb = rb.bearer_auth(clean_token(token)?);
        }

        let call = format!("q{:06}", CALL_SEQ.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(
            call=%call,
            target_url=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=self.timeout.as_millis() as u64,
            authenticated=bearer.is_some(),
            "http.request.start"
        );

        let started = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(call=%call, error=%err, "http.network_error");
            self.transport_error(err)
        })?;
        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(call=%call, error=%err, "http.network_error.body");
            self.transport_error(err)
        })?;

        tracing::debug!(
            call=%call,
            %status,
            duration_ms=started.elapsed().as_millis() as u64,
            body_len=bytes.len(),
            x_request_id=%request_id,
            "http.response"
        );
        if raw_logging() {
            let end = bytes.len().min(RAW_MAX_BODY);
            tracing::info!(
                target: "http.raw",
                %call,
                %status,
                body=%String::from_utf8_lossy(&bytes[..end]),
                truncated=bytes.len() > RAW_MAX_BODY
            );
        }

        if !status.is_success() {
            let message = error_message(&bytes);
            tracing::warn!(call=%call, %status, message=%message, "http.error");
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            let snippet = snippet(&bytes);
            tracing::warn!(call=%call, serde_err=%e, body_snippet=%snippet, "http.response.decode_error");
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(self.timeout)
        } else {
            HttpError::Network(err.to_string())
        }
    }
}

fn raw_logging() -> bool {
    matches!(env::var(RAW_ENV).as_deref(), Ok("1" | "true" | "yes"))
}

/// Best human-readable message from an error body, else a snippet of it.
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Envelope {
        Nested { error: Detail },
        Flat {
            #[serde(default)]
            message: String,
            #[serde(default)]
            detail: String,
            #[serde(default)]
            error: String,
        },
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    let found = match serde_json::from_slice::<Envelope>(body) {
        Ok(Envelope::Nested { error }) => Some(error.message),
        Ok(Envelope::Flat {
            message,
            detail,
            error,
        }) => [message, detail, error].into_iter().find(|m| !m.is_empty()),
        Err(_) => None,
    };
    found.unwrap_or_else(|| snippet(body))
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_MAX) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

/// Strip quotes and whitespace pasted around a key and reject anything
/// that cannot travel in an `Authorization` header.
fn clean_token(raw: &str) -> Result<String, HttpError> {
    let token: String = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if token.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !token.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(token)
}
