//! The `PageSource` and `Validator` contracts the crawler and racer consume.
//!
//! Both are external collaborators from the core engine's point of view: the
//! engine only ever talks to these traits, never to a concrete HTTP client.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A vertex in the link graph, as returned by a `PageSource`.
///
/// A page reported as `missing` upstream never becomes a `Page` value; it
/// surfaces as [`PageSourceError::PageNotFound`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: u32,
    pub title: String,
    pub namespace: i32,
    pub links: Vec<String>,
}

/// The result of one `PageSource::fetch` call.
///
/// `pages` holds every page in the batch that was *not* reported missing.
/// `next` is the opaque continuation token to re-issue the same `titles` with,
/// when the upstream has more links left to deliver for this batch. `err`
/// carries a [`PageSourceError::PageNotFound`] when one of the requested
/// titles doesn't exist upstream; the other, non-missing pages in `pages` are
/// still usable by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchOutcome {
    pub pages: Vec<Page>,
    pub next: Option<String>,
    pub err: Option<PageSourceError>,
}

/// Errors a `PageSource` can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageSourceError {
    /// One of the requested titles does not exist upstream.
    #[error("page not found: {title}")]
    PageNotFound { title: String },
    /// Any other upstream failure: transport error, malformed response, or an
    /// `errors`/`warnings` block in the response body.
    #[error("upstream server error: {0}")]
    ServerError(String),
}

/// Resolves batches of titles to their outbound links.
///
/// `titles` may contain up to 50 entries per call (the upstream MediaWiki
/// limit); callers are responsible for chunking larger requests. Ordering
/// between the request and the response is not guaranteed — callers match
/// pages to requested titles by title.
///
/// Implementations must be safe to call concurrently: the crawler fans out
/// many simultaneous `fetch` calls against a single shared `PageSource`.
///
/// `cancel` is the enclosing crawl's cancellation scope. A rate-limit retry
/// loop inside an implementation MUST race its backoff sleep (and, ideally,
/// the request itself) against `cancel` so a wiki that keeps returning
/// "too many requests" cannot keep a `fetch` call alive past the crawl's
/// deadline.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(
        &self,
        titles: &[String],
        continuation: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, PageSourceError>;
}

/// Errors from validating a candidate `(origin, destination)` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorError {
    #[error("invalid empty input: origin={origin:?}, destination={destination:?}")]
    InvalidEmptyInput { origin: String, destination: String },
    #[error("page not found: {title}")]
    PageNotFound { title: String },
    #[error("upstream server error: {0}")]
    ServerError(String),
}

impl From<PageSourceError> for ValidatorError {
    fn from(err: PageSourceError) -> Self {
        match err {
            PageSourceError::PageNotFound { title } => ValidatorError::PageNotFound { title },
            PageSourceError::ServerError(msg) => ValidatorError::ServerError(msg),
        }
    }
}

/// Rejects empty inputs and unknown origin/destination titles before a crawl starts.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, origin: &str, destination: &str) -> Result<(), ValidatorError>;
}
