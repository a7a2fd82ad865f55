//! Outbound page fetcher with bounded timeouts and safe logging.
//!
//! - One GET per call, no retries; the timeout applies to the whole exchange
//! - Redirects are followed up to a configurable limit
//! - Sensitive query params are redacted before anything is logged
//!
//! Example (no_run):
//! ```rust,no_run
//! # async fn demo() -> Result<(), analyzer_http::HttpError> {
//! let client = analyzer_http::HttpClient::builder().build()?;
//! let page = client
//!     .get_page("https://example.com", analyzer_http::RequestOpts::default())
//!     .await?;
//! assert!(page.status.is_success());
//! # Ok(()) }
//! ```
//!
//! Observability: `tracing` events are emitted for request start
//! (`http.request.start`), response headers (`http.response.headers`), a
//! truncated body snippet at trace level, and final errors (`http.error`).

use analyzer_common::AnalyzerError;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

const SNIPPET_MAX: usize = 500;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status} for {url}")]
    Status { status: StatusCode, url: String },
}

impl From<HttpError> for AnalyzerError {
    fn from(err: HttpError) -> Self {
        AnalyzerError::Network(err.to_string())
    }
}

// ==============================
// Request options & response
// ==============================

/// Per-request tuning knobs.
///
/// ```
/// use analyzer_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(3)),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 3);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
}

/// A fetched document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl Page {
    /// Whether the server labelled the body as media (`image/*`, `audio/*`,
    /// `video/*`, `font/*`). Anything else may still hold markup.
    pub fn is_media(&self) -> bool {
        let Some(ct) = &self.content_type else {
            return false;
        };
        let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        ["image/", "audio/", "video/", "font/"]
            .iter()
            .any(|top| mime.starts_with(top))
    }
}

// ==============================
// Client
// ==============================

pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    max_redirects: usize,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_redirects: 5,
            user_agent: concat!("page-analyzer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = dur;
        self
    }

    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = dur;
        self
    }

    pub fn max_redirects(mut self, n: usize) -> Self {
        self.max_redirects = n;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, HttpError> {
        let inner = Client::builder()
            .connect_timeout(self.connect_timeout)
            .redirect(Policy::limited(self.max_redirects))
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(HttpClient {
            inner,
            default_timeout: self.timeout,
        })
    }
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Start from the default settings (10s timeout, 5 redirects).
    ///
    /// ```no_run
    /// use analyzer_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::builder()
    ///     .timeout(Duration::from_secs(2))
    ///     .user_agent("probe/1.0")
    ///     .build()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// GET `url` and return its decoded body.
    ///
    /// Non-success statuses (after redirects) are reported as
    /// [`HttpError::Status`]; the body is not returned in that case.
    pub async fn get_page(&self, url: &str, opts: RequestOpts) -> Result<Page, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut rb = self.inner.get(url.clone()).timeout(timeout);
        if let Some(hdrs) = opts.headers {
            rb = rb.headers(hdrs);
        }

        let req_id = format!("r{}", NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed));
        let (host_path, redacted_q) = redact_query(&url);
        tracing::debug!(
            req_id=%req_id,
            host_path=%host_path,
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|err| transport_error(&req_id, err, timeout, "send"))?;

        let status = resp.status();
        let final_url = resp.url().clone();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let declared_len = content_len(resp.headers());

        let body = resp
            .text()
            .await
            .map_err(|err| transport_error(&req_id, err, timeout, "body"))?;
        let dur_ms = t0.elapsed().as_millis() as u64;
        let redirected = final_url != url;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            declared_len=?declared_len,
            content_type=?content_type,
            redirected,
            "http.response.headers"
        );
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&body),
            "http.response.body_snippet"
        );

        if !status.is_success() {
            let (final_host_path, _) = redact_query(&final_url);
            tracing::warn!(
                req_id=%req_id,
                %status,
                host_path=%final_host_path,
                "http.error"
            );
            return Err(HttpError::Status {
                status,
                url: final_host_path,
            });
        }

        Ok(Page {
            url: final_url,
            status,
            content_type,
            body,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn transport_error(req_id: &str, err: reqwest::Error, timeout: Duration, stage: &str) -> HttpError {
    let timed_out = err.is_timeout();
    let message = err.without_url().to_string();
    tracing::warn!(
        req_id=%req_id,
        stage,
        timed_out,
        message=%message,
        "http.network_error"
    );
    if timed_out {
        HttpError::Timeout(timeout)
    } else {
        HttpError::Network(message)
    }
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "apikey"
            | "token"
            | "secret"
            | "client_secret"
            | "password"
            | "session"
    )
}

/// "host + path" for logging, plus the query list with secrets masked.
fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let masked = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), masked)
        })
        .collect();
    (host_path, redacted)
}

fn snip_body(body: &str) -> String {
    if body.len() <= SNIPPET_MAX {
        return body.to_string();
    }
    let mut end = SNIPPET_MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

fn content_len(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
}
