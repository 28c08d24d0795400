//! Network file source.
//!
//! [`HttpFileSource`] resolves resources by GETting their URL. Each request
//! runs as its own task on the supplied runtime; dropping the returned handle
//! aborts the task, so the callback cannot fire afterwards.
//!
//! ### Response mapping
//! - 2xx: payload plus `ETag`, `Last-Modified` and expiry headers
//! - 204: `no_content` without an error
//! - 404: `no_content` with a `NotFound` error
//! - other statuses: `Server` (or `RateLimit` for 429)
//! - transport failures: `Connection`
//! - bodies over `max_bytes`: `Other`

pub mod headers;
pub mod url;

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, header};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub use headers::{apply_cache_headers, max_age, parse_http_date};
pub use url::parse_http_url;

use tilecache_core::config::AppConfig;
use tilecache_core::{AsyncRequest, Callback, Error, FileSource, Resource, Response, ResponseError};

/// Configuration for the network file source.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "tilecache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "tilecache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// [`FileSource`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFileSource {
    http: Client,
    config: FetchConfig,
    runtime: Handle,
}

impl HttpFileSource {
    /// Create a new network source spawning its requests on `runtime`.
    pub fn new(config: FetchConfig, runtime: Handle) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, runtime })
    }

    /// Fetch `resource` and convert the outcome into a [`Response`].
    ///
    /// Failures are folded into the response's error rather than returned.
    pub async fn fetch(&self, resource: &Resource) -> Response {
        fetch(&self.http, &resource.url, self.config.max_bytes)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(url = %resource.url, error = %e, "network request failed");
                Response::failed(ResponseError::from(e))
            })
    }
}

impl FileSource for HttpFileSource {
    fn request(&self, resource: Resource, callback: Callback) -> Box<dyn AsyncRequest> {
        let source = self.clone();
        let task = self.runtime.spawn(async move {
            let response = source.fetch(&resource).await;
            callback(response);
        });
        Box::new(HttpRequest { task })
    }
}

/// Handle for an in-flight network request. Aborts the request on drop.
#[derive(Debug)]
pub struct HttpRequest {
    task: JoinHandle<()>,
}

impl Drop for HttpRequest {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl AsyncRequest for HttpRequest {}

async fn fetch(http: &Client, url_str: &str, max_bytes: usize) -> Result<Response, Error> {
    let start = Instant::now();
    let url = parse_http_url(url_str)?;

    let response = http.get(url.as_str()).send().await.map_err(|e| {
        if e.is_timeout() {
            Error::Connection(format!("timeout: {e}"))
        } else {
            Error::Connection(format!("network error: {e}"))
        }
    })?;

    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(Response::no_content());
    }
    if !status.is_success() {
        return Err(Error::HttpStatus(status.as_u16()));
    }

    if let Some(len) = response.content_length()
        && len as usize > max_bytes
    {
        return Err(Error::TooLarge(format!("{len} bytes exceeds {max_bytes}")));
    }

    let headers = response.headers().clone();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Connection(format!("failed to read response: {e}")))?;

    if bytes.len() > max_bytes {
        return Err(Error::TooLarge(format!("{} bytes exceeds {max_bytes}", bytes.len())));
    }

    tracing::debug!(
        url = %url,
        status = status.as_u16(),
        bytes = bytes.len(),
        content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        fetch_ms = start.elapsed().as_millis() as u64,
        "fetched resource"
    );

    let mut out = Response::with_data(bytes);
    apply_cache_headers(&mut out, &headers, chrono::Utc::now());
    Ok(out)
}
