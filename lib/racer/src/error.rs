//! Error taxonomy surfaced to callers of [`crate::Racer`].

use provider::{PageSourceError, ValidatorError};

/// Non-fatal conditions raised while a single crawl is in flight.
///
/// These travel over the crawler's `errors()` channel; a `PageNotFound` for
/// some page other than the destination is not one of them; it is logged and
/// the crawl moves on (§4.3/§4.4 of the design).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CrawlError {
    #[error("upstream server error: {0}")]
    ServerError(String),
    #[error("destination unreachable: {destination}")]
    DestinationUnreachable { destination: String },
}

impl From<PageSourceError> for CrawlError {
    fn from(err: PageSourceError) -> Self {
        match err {
            PageSourceError::ServerError(msg) => CrawlError::ServerError(msg),
            // a bare PageNotFound surfacing as a hard fetch error (rather than
            // inside FetchOutcome::err) still isn't fatal to the crawl as a whole.
            PageSourceError::PageNotFound { title } => {
                CrawlError::ServerError(format!("page not found: {title}"))
            }
        }
    }
}

/// The four error kinds a `Racer::find_path` call can return.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RacerError {
    #[error("invalid empty input: origin={origin:?}, destination={destination:?}")]
    InvalidEmptyInput { origin: String, destination: String },
    #[error("page not found: {title}")]
    PageNotFound { title: String },
    #[error("destination unreachable: {destination}")]
    DestinationUnreachable { destination: String },
    #[error("upstream server error: {0}")]
    ServerError(String),
}

impl From<ValidatorError> for RacerError {
    fn from(err: ValidatorError) -> Self {
        match err {
            ValidatorError::InvalidEmptyInput { origin, destination } => {
                RacerError::InvalidEmptyInput { origin, destination }
            }
            ValidatorError::PageNotFound { title } => RacerError::PageNotFound { title },
            ValidatorError::ServerError(msg) => RacerError::ServerError(msg),
        }
    }
}

impl From<CrawlError> for RacerError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::ServerError(msg) => RacerError::ServerError(msg),
            CrawlError::DestinationUnreachable { destination } => RacerError::DestinationUnreachable { destination },
        }
    }
}
