//! Fetch controller
//!
//! [`Client::fetch`] drives the bounded retry loop: fetch, let the site
//! handler transform the content, analyze it, and either stop or wait and
//! fetch again. Transport and decoding failures abort the call; content that
//! merely is not final yet never does.

use crate::detector::{ContentAnalysis, ContentDetector};
use crate::error::FetchError;
use crate::handlers::{HandlerRegistry, SiteHandler};
use crate::DEFAULT_USER_AGENT;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";
const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate";

/// Fetch options
///
/// Set everything before building the [`Client`]; a built client never
/// changes its options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: usize,
    /// Upper bound for any single wait between attempts
    pub max_wait_time: Duration,
    /// Optional budget for a whole fetch call, across all attempts
    pub deadline: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            max_wait_time: Duration::from_secs(10),
            deadline: None,
        }
    }
}

/// Result of a fetch call
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    /// Most recently fetched and processed content
    pub content: String,
    /// Analysis of `content`; `None` when the retry policy was disabled
    pub analysis: Option<ContentAnalysis>,
    /// Number of HTTP requests made
    pub attempts: usize,
    /// Name of the site handler bound to the call, if any
    pub handler: Option<&'static str>,
    /// HTTP status code of the last response
    pub status_code: u16,
}

/// Builder for configuring a [`Client`]
#[derive(Debug, Default)]
pub struct ClientBuilder {
    options: FetchOptions,
    detector: Option<ContentDetector>,
    registry: Option<HandlerRegistry>,
}

impl ClientBuilder {
    /// Create a builder with default options, detector and handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options at once
    pub fn options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = ua.into();
        self
    }

    /// Set the number of retries after the first attempt
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.options.max_retries = retries;
        self
    }

    /// Set the upper bound for a single wait between attempts
    pub fn max_wait_time(mut self, wait: Duration) -> Self {
        self.options.max_wait_time = wait;
        self
    }

    /// Set a budget for a whole fetch call
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.options.deadline = Some(deadline);
        self
    }

    /// Use a customized content detector
    pub fn detector(mut self, detector: ContentDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Use a custom handler registry instead of the built-in handlers
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client, FetchError> {
        let options = self.options;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        // Only gzip is decoded; other encodings pass through as raw bytes
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .gzip(true)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        Ok(Client {
            http,
            options,
            detector: Arc::new(self.detector.unwrap_or_default()),
            registry: Arc::new(self.registry.unwrap_or_else(HandlerRegistry::with_defaults)),
        })
    }
}

/// Content-aware HTTP client
///
/// Cheap to clone; clones share the detector and handler registry, which are
/// read-only once the client is built.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    options: FetchOptions,
    detector: Arc<ContentDetector>,
    registry: Arc<HandlerRegistry>,
}

/// One response body, decoded to text
struct Page {
    status_code: u16,
    body: String,
}

impl Client {
    /// Create a client with default options and the built-in handlers
    pub fn new() -> Result<Self, FetchError> {
        ClientBuilder::new().build()
    }

    /// Start configuring a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Options this client was built with
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Content detector used to analyze each attempt
    pub fn detector(&self) -> &ContentDetector {
        &self.detector
    }

    /// Site handlers, in priority order
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Fetch a page with the retry policy enabled
    pub async fn fetch_page(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        self.fetch(url, true).await
    }

    /// Fetch a page
    ///
    /// With `enable_retry` off this is a single plain GET: no handler, no
    /// analysis. With it on, the content is re-fetched until the detector
    /// and the site handler agree it is final, or the retry budget runs out.
    /// Either way the last content obtained is returned.
    pub async fn fetch(&self, url: &str, enable_retry: bool) -> Result<FetchOutcome, FetchError> {
        let url = parse_url(url)?;

        if !enable_retry {
            let page = self.fetch_once(&url).await?;
            return Ok(FetchOutcome {
                content: page.body,
                analysis: None,
                attempts: 1,
                handler: None,
                status_code: page.status_code,
            });
        }

        let mut session = RetrySession::new(self.registry.resolve(&url), &self.options);

        loop {
            let page = self.fetch_once(&url).await?;
            let mut content = page.body;

            if let Some(handler) = session.handler {
                match handler.process_content(&content, &url) {
                    Ok(processed) => content = processed,
                    Err(e) => {
                        debug!(handler = handler.name(), error = %e, "Handler failed, keeping content")
                    }
                }
            }

            let analysis = self.detector.analyze(&content);
            if session.attempt == 0 {
                log_content_analysis(&url, &analysis);
            }

            let site_needs_retry = session
                .handler
                .is_some_and(|handler| handler.requires_retry(&content));

            let done = (analysis.is_loaded && !site_needs_retry) || session.is_last_attempt();
            if done || !(analysis.requires_retry || site_needs_retry) {
                return Ok(session.finish(content, analysis, page.status_code));
            }

            let wait = session.wait_for(&analysis);
            if session.would_overrun(wait) {
                warn!(url = %url, attempt = session.attempt, "Deadline reached, returning current content");
                return Ok(session.finish(content, analysis, page.status_code));
            }

            info!(
                "Content not fully loaded, waiting {:?} before retry {}/{}",
                wait,
                session.attempt + 1,
                session.max_retries
            );
            tokio::time::sleep(wait).await;
            session.attempt += 1;
        }
    }

    /// Perform a single GET and decode the body
    async fn fetch_once(&self, url: &Url) -> Result<Page, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status_code = response.status().as_u16();
        debug!(url = %url, status_code, "Received response");

        let body = read_body(response).await?;
        Ok(Page {
            status_code,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Fetch a URL with a default client and the retry policy enabled
pub async fn fetch(url: &str) -> Result<FetchOutcome, FetchError> {
    Client::new()?.fetch_page(url).await
}

/// State of one retrying fetch call
struct RetrySession<'a> {
    /// Bound once before the first attempt
    handler: Option<&'a dyn SiteHandler>,
    attempt: usize,
    max_retries: usize,
    max_wait_time: Duration,
    deadline: Option<Instant>,
}

impl<'a> RetrySession<'a> {
    fn new(handler: Option<&'a dyn SiteHandler>, options: &FetchOptions) -> Self {
        Self {
            handler,
            attempt: 0,
            max_retries: options.max_retries,
            max_wait_time: options.max_wait_time,
            // A budget too large to represent is no deadline at all
            deadline: options
                .deadline
                .and_then(|budget| Instant::now().checked_add(budget)),
        }
    }

    fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_retries
    }

    /// Longer of the detector's and the handler's wait, capped at max_wait_time
    fn wait_for(&self, analysis: &ContentAnalysis) -> Duration {
        let mut wait = analysis.suggested_wait;
        if let Some(handler) = self.handler {
            wait = wait.max(handler.wait_time());
        }
        wait.min(self.max_wait_time)
    }

    /// Whether waiting `wait` and fetching again would run past the deadline
    fn would_overrun(&self, wait: Duration) -> bool {
        self.deadline.is_some_and(|deadline| {
            Instant::now()
                .checked_add(wait)
                .is_some_and(|resume| resume >= deadline)
        })
    }

    fn finish(&self, content: String, analysis: ContentAnalysis, status_code: u16) -> FetchOutcome {
        FetchOutcome {
            content,
            analysis: Some(analysis),
            attempts: self.attempt + 1,
            handler: self.handler.map(|handler| handler.name()),
            status_code,
        }
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FetchError::InvalidUrl(format!(
            "{url}: unsupported scheme {scheme}"
        ))),
    }
}

/// Read the whole response body
///
/// gzip bodies are decompressed by the HTTP client while streaming; a broken
/// stream surfaces here as a decode error.
async fn read_body(response: reqwest::Response) -> Result<Bytes, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_body)?;
        body.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(body))
}

fn log_content_analysis(url: &Url, analysis: &ContentAnalysis) {
    info!(
        url = %url,
        content_length = analysis.content_length,
        is_loaded = analysis.is_loaded,
        is_loading_page = analysis.is_loading_page,
        is_cookie_banner = analysis.is_cookie_banner,
        is_adblock_banner = analysis.is_adblock_banner,
        is_interstitial = analysis.is_interstitial,
        requires_retry = analysis.requires_retry,
        "Content analysis"
    );

    if !analysis.loading_indicators.is_empty() {
        info!(indicators = ?analysis.loading_indicators, "Loading indicators");
    }

    if !analysis.suggested_wait.is_zero() {
        info!(wait = ?analysis.suggested_wait, "Suggested wait time");
    }
}
