//! Playlist transport.
//!
//! The loader only depends on the [`Transport`] capability; [`HttpTransport`]
//! is the reqwest-backed implementation with retry, timeout and abort.

use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::RequestContext;
use crate::config::RetryPolicy;
use crate::error::{LoaderError, Result};

/// Everything a transport needs to perform one playlist fetch.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub url: String,
    pub context: RequestContext,
    /// Opaque cache key; empty when the response must not be cached.
    pub cache_key: String,
    pub policy: RetryPolicy,
}

/// Successful fetch result.
#[derive(Debug, Clone)]
pub struct LoaderResponse {
    pub text: String,
    /// URL after redirects. May be empty when the transport cannot tell.
    pub url: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Raw information about a failed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl From<&LoaderError> for ResponseInfo {
    fn from(err: &LoaderError) -> Self {
        let status = match err {
            LoaderError::Status { status, .. } => Some(*status),
            LoaderError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Timing of a single load.
#[derive(Debug, Clone)]
pub struct LoadStats {
    pub trequest: Instant,
    /// Response headers received.
    pub tfirst: Option<Instant>,
    /// Body fully received.
    pub tload: Option<Instant>,
    /// Body parsed by the loader.
    pub tparsed: Option<Instant>,
    pub retry: u32,
    pub loaded: u64,
    pub mtime: Option<DateTime<Utc>>,
}

impl LoadStats {
    pub fn start() -> Self {
        Self {
            trequest: Instant::now(),
            tfirst: None,
            tload: None,
            tparsed: None,
            retry: 0,
            loaded: 0,
            mtime: None,
        }
    }
}

/// Final outcome of a load, as reported through [`LoaderCallbacks`].
#[derive(Debug)]
pub enum LoadOutcome {
    Success(LoaderResponse),
    Error(ResponseInfo),
    Timeout,
}

type Completion = Box<dyn FnOnce(LoadOutcome, LoadStats) + Send>;

/// Completion continuations for one load.
///
/// Every method consumes the callbacks, so a transport can report at most
/// one outcome per load.
pub struct LoaderCallbacks {
    complete: Completion,
}

impl LoaderCallbacks {
    pub fn new(complete: impl FnOnce(LoadOutcome, LoadStats) + Send + 'static) -> Self {
        Self {
            complete: Box::new(complete),
        }
    }

    pub fn on_success(self, response: LoaderResponse, stats: LoadStats) {
        (self.complete)(LoadOutcome::Success(response), stats)
    }

    pub fn on_error(self, response: ResponseInfo, stats: LoadStats) {
        (self.complete)(LoadOutcome::Error(response), stats)
    }

    pub fn on_timeout(self, stats: LoadStats) {
        (self.complete)(LoadOutcome::Timeout, stats)
    }
}

impl std::fmt::Debug for LoaderCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderCallbacks").finish_non_exhaustive()
    }
}

/// A single-use playlist fetcher.
///
/// `load` must return promptly; the outcome is reported later through the
/// callbacks, from whatever thread or task the transport completes on.
/// After `abort` no callback may fire.
pub trait Transport: Send + Sync {
    fn load(&self, request: LoadRequest, callbacks: LoaderCallbacks);

    fn abort(&self);

    /// Abort and release any held resources.
    fn destroy(&self) {
        self.abort();
    }
}

/// Creates a fresh transport for every request.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Arc<dyn Transport> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Transport> {
        self()
    }
}

/// HTTP transport backed by a shared [`reqwest::Client`].
///
/// Each attempt is bounded by the policy timeout. A timeout is reported
/// immediately; network errors and non-2xx statuses are retried with a
/// doubling delay until `max_retries` is exhausted.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    cancel: CancellationToken,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
        }
    }
}

impl Transport for HttpTransport {
    fn load(&self, request: LoadRequest, callbacks: LoaderCallbacks) {
        let stats = LoadStats::start();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("No async runtime available to load {}: {}", request.url, e);
                callbacks.on_error(
                    ResponseInfo {
                        status: None,
                        message: e.to_string(),
                    },
                    stats,
                );
                return;
            }
        };

        let client = self.client.clone();
        let cancel = self.cancel.clone();
        runtime.spawn(async move {
            let url = request.url.clone();
            let mut stats = stats;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Playlist load aborted: {}", url);
                }
                outcome = fetch_with_retry(&client, &request, &mut stats) => {
                    if cancel.is_cancelled() {
                        debug!("Dropping result of aborted load: {}", url);
                        return;
                    }
                    match outcome {
                        FetchOutcome::Success(response) => callbacks.on_success(response, stats),
                        FetchOutcome::Error(info) => callbacks.on_error(info, stats),
                        FetchOutcome::Timeout => callbacks.on_timeout(stats),
                    }
                }
            }
        });
    }

    fn abort(&self) {
        self.cancel.cancel();
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builds one [`HttpTransport`] per request, sharing a connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
    client: Client,
}

impl HttpTransportFactory {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl TransportFactory for HttpTransportFactory {
    fn create(&self) -> Arc<dyn Transport> {
        Arc::new(HttpTransport::new(self.client.clone()))
    }
}

enum FetchOutcome {
    Success(LoaderResponse),
    Error(ResponseInfo),
    Timeout,
}

async fn fetch_with_retry(
    client: &Client,
    request: &LoadRequest,
    stats: &mut LoadStats,
) -> FetchOutcome {
    let policy = &request.policy;

    if let Err(e) = Url::parse(&request.url) {
        let err = LoaderError::InvalidUrl(format!("{}: {}", request.url, e));
        warn!("{}", err);
        return FetchOutcome::Error(ResponseInfo::from(&err));
    }

    let mut attempt = 0;
    loop {
        let result = tokio::time::timeout(policy.timeout, fetch_once(client, &request.url, stats)).await;

        let err = match result {
            Ok(Ok(response)) => return FetchOutcome::Success(response),
            Ok(Err(e)) => e,
            Err(_) => {
                let err = LoaderError::Timeout {
                    url: request.url.clone(),
                    after: policy.timeout,
                };
                warn!("{}", err);
                return FetchOutcome::Timeout;
            }
        };

        if attempt >= policy.max_retries {
            warn!(
                "Playlist fetch failed for {} (attempt {}/{}): {}",
                request.url,
                attempt + 1,
                policy.max_retries + 1,
                err
            );
            return FetchOutcome::Error(ResponseInfo::from(&err));
        }

        attempt += 1;
        stats.retry = attempt;
        let delay = policy.delay_for_attempt(attempt);
        warn!(
            "Playlist fetch failed for {}: {}, retrying in {}ms ({}/{})",
            request.url,
            err,
            delay.as_millis(),
            attempt,
            policy.max_retries
        );
        tokio::time::sleep(delay).await;
    }
}

async fn fetch_once(client: &Client, url: &str, stats: &mut LoadStats) -> Result<LoaderResponse> {
    let response = client.get(url).send().await?;
    stats.tfirst = Some(Instant::now());

    let status = response.status();
    if !status.is_success() {
        return Err(LoaderError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let resolved_url = response.url().to_string();
    let last_modified = response
        .headers()
        .get(header::LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let text = response.text().await?;
    stats.tload = Some(Instant::now());
    stats.loaded = text.len() as u64;

    Ok(LoaderResponse {
        text,
        url: resolved_url,
        last_modified,
    })
}
