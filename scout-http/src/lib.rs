//! Minimal HTTP client with safe logging, retries, and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - JSON and form-encoded bodies, plus a streaming escape hatch
//! - Redacts sensitive query params and never logs secret values
//! - Retries 429/5xx with exponential backoff and `Retry-After` support
//! - Optional *raw* request/response logging via `SCOUT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), scout_http::HttpError> {
//! let client = scout_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", scout_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/query/none), not the secret.

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub use reqwest::header;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "SCOUT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;

const SECRET_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
    "password",
    "enc_password",
    "signed_body",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SECRET_KEYS.contains(&lower.as_str())
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: &Payload<'_>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let v = if is_secret_key(name.as_str()) {
            "<redacted>".to_string()
        } else {
            val.to_str().unwrap_or("").to_string()
        };
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    match body {
        Payload::Json(bytes) => {
            let mut s = String::from_utf8_lossy(bytes).to_string();
            if s.len() > RAW_MAX_BODY {
                s.truncate(RAW_MAX_BODY);
                s.push_str("...");
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        }
        Payload::Form(fields) => {
            for (k, v) in fields.iter() {
                let v = if is_secret_key(k) { "<redacted>" } else { v.as_ref() };
                parts.push(format!(
                    "--data-urlencode '{}={}'",
                    k,
                    v.replace('\'', r"'\''")
                ));
            }
        }
        Payload::Empty => {}
    }
    let (host_path, query) = redact_query(url);
    if query.is_empty() {
        parts.push(format!("'{}://{}'", url.scheme(), host_path));
    } else {
        let q = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parts.push(format!("'{}://{}?{}'", url.scheme(), host_path, q));
    }
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_key(&key) || key.starts_with("ig-set-") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
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
    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller-level retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::Url(_) | Self::Build(_) | Self::Decode(..) => false,
        }
    }
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use scout_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Auth via query param (e.g. Google: `key=...`)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use scout_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     auth: Some(Auth::Query {
///         name: "key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

/// A decoded body together with the response status and headers.
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

enum Payload<'a> {
    Empty,
    Json(Vec<u8>),
    Form(&'a [(&'a str, Cow<'a, str>)]),
}

impl Payload<'_> {
    fn is_some(&self) -> bool {
        !matches!(self, Payload::Empty)
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use scout_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Self::with_user_agent(base, concat!("scout/", env!("CARGO_PKG_VERSION")))
    }

    /// Same as [`HttpClient::new`] with a custom `User-Agent`.
    pub fn with_user_agent(base: &str, user_agent: &str) -> Result<Self, HttpError> {
        // Url::join drops the last path segment unless the base ends with '/'.
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use scout_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com")?.with_retries(5);
    /// assert_eq!(client.max_retries, 5);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_internal(Method::GET, path, Payload::Empty, opts)
            .await
            .map(|resp| resp.body)
    }

    /// POST JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        self.request_internal(Method::POST, path, Payload::Json(bytes), opts)
            .await
            .map(|resp| resp.body)
    }

    /// POST an `application/x-www-form-urlencoded` body and keep the response headers.
    pub async fn post_form<T>(
        &self,
        path: &str,
        form: &[(&str, Cow<'_, str>)],
        opts: RequestOpts<'_>,
    ) -> Result<HttpResponse<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_internal(Method::POST, path, Payload::Form(form), opts)
            .await
    }

    /// POST JSON and hand back the live response for incremental reading.
    ///
    /// No retries happen here: once bytes start flowing the caller owns the
    /// stream. Non-success statuses are still turned into [`HttpError::Api`].
    pub async fn post_json_stream<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<reqwest::Response, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let payload = Payload::Json(bytes);
        let mut rb = self.inner.request(Method::POST, url.clone());
        if let Some(timeout) = opts.timeout {
            rb = rb.timeout(timeout);
        }
        rb = apply_payload(rb, &payload);
        rb = self.apply_opts(rb, &opts)?;

        let req_id = next_request_id();
        tracing::debug!(
            req_id=%req_id,
            method="POST",
            host_path=%redact_query(&url).0,
            auth_kind=auth_kind(&opts),
            "http.stream.start"
        );
        if raw_enabled() {
            let curl = make_curl(
                &Method::POST,
                &url,
                opts.headers.as_ref().unwrap_or(&HeaderMap::new()),
                &payload,
            );
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let resp = rb.send().await.map_err(|e| {
            tracing::warn!(req_id=%req_id, message=%e, "http.network_error.stream");
            HttpError::Network(e.to_string())
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let request_id = request_id_header(resp.headers());
        let bytes = resp.bytes().await.unwrap_or_default();
        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%request_id,
            "http.stream.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id,
        })
    }

    // ==============================
    // Core request implementation
    // ==============================

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        if let Ok(abs) = Url::parse(path) {
            return Ok(abs);
        }
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    fn apply_opts(
        &self,
        mut rb: RequestBuilder,
        opts: &RequestOpts<'_>,
    ) -> Result<RequestBuilder, HttpError> {
        let mut query: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
            }
            Some(Auth::Query { name, value }) => query.push((*name, value.as_ref())),
            Some(Auth::None) | None => {}
        }

        if !query.is_empty() {
            rb = rb.query(&query);
        }
        Ok(rb)
    }

    async fn request_internal<T>(
        &self,
        method: Method,
        path: &str,
        payload: Payload<'_>,
        opts: RequestOpts<'_>,
    ) -> Result<HttpResponse<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut attempt = 0usize;

        loop {
            // ----- Build request -----
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            rb = apply_payload(rb, &payload);
            rb = self.apply_opts(rb, &opts)?;

            // ----- Safe request logging (pre-send) -----
            let redacted_q: Vec<(String, String)> = opts
                .query
                .as_ref()
                .map(|q| {
                    q.iter()
                        .map(|(k, v)| {
                            let v = if is_secret_key(k) {
                                "<redacted>".to_string()
                            } else {
                                v.as_ref().to_string()
                            };
                            ((*k).to_string(), v)
                        })
                        .collect()
                })
                .unwrap_or_default();

            let req_id = next_request_id();
            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%redact_query(&url).0,
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                auth_kind=auth_kind(&opts),
                has_body=%payload.is_some(),
                "http.request.start"
            );

            if raw_enabled() {
                let curl = make_curl(
                    &method,
                    &url,
                    opts.headers.as_ref().unwrap_or(&HeaderMap::new()),
                    &payload,
                );
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            // ----- Send -----
            let t0 = std::time::Instant::now();
            let sent = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes().await.map(|bytes| (status, headers, bytes))
                }
                Err(err) => Err(err),
            };
            let (status, headers, bytes) = match sent {
                Ok(parts) => parts,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        message=%message,
                        "http.network_error"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;
            let request_id = request_id_header(&headers);

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%request_id,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target:"http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%text,
                    truncated
                );
            }

            let snippet = snip_body(&bytes);
            tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

            // ----- Success path -----
            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes)
                    .map(|body| HttpResponse {
                        status,
                        headers,
                        body,
                    })
                    .map_err(|e| {
                        tracing::warn!(
                            req_id=%req_id,
                            serde_line=%e.line(),
                            serde_col=%e.column(),
                            serde_err=%e.to_string(),
                            body_snippet=%snippet,
                            "http.response.decode_error"
                        );
                        HttpError::Decode(e.to_string(), snippet)
                    });
            }

            // ----- Non-success: maybe retry -----
            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;

            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let delay = match retry_after_delay_secs(&headers) {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%request_id,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }
    }
}

// ==============================
// Helpers
// ==============================

fn apply_payload(rb: RequestBuilder, payload: &Payload<'_>) -> RequestBuilder {
    match payload {
        Payload::Empty => rb,
        Payload::Json(bytes) => rb
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes.clone()),
        Payload::Form(fields) => {
            let pairs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb.form(&pairs)
        }
    }
}

fn auth_kind(opts: &RequestOpts<'_>) -> &'static str {
    match &opts.auth {
        Some(Auth::Bearer(_)) => "bearer",
        Some(Auth::Query { .. }) => "query",
        Some(Auth::None) | None => "none",
    }
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1 << shift))
}

fn next_request_id() -> String {
    format!(
        "r{:x}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    )
}

fn request_id_header(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-ig-request-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn extract_error_message(body: &[u8]) -> String {
    // Google: {"error_message":"..."}; Instagram: {"message":"..."}; Ollama: {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error_message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: serde_json::Value,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [&m.message, &m.error_message, &m.detail] {
            if !candidate.is_empty() {
                return candidate.clone();
            }
        }
        match m.error {
            serde_json::Value::String(s) if !s.is_empty() => return s,
            serde_json::Value::Object(obj) => {
                if let Some(s) = obj.get("message").and_then(|v| v.as_str()) {
                    return s.to_string();
                }
            }
            _ => {}
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace
    s.retain(|ch| !ch.is_ascii_whitespace());

    // 3) Ensure ASCII and no control chars
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = if is_secret_key(&k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k, v)
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}
