//! Deadline-bounded orchestration: validate, crawl, return the winner.

use std::sync::Arc;
use std::time::{Duration, Instant};

use provider::{PageSource, Validator};
use tracing::{event, Level};

use crate::crawler::Crawler;
use crate::error::{CrawlError, RacerError};
use crate::path::Path;

/// The outcome of a successful `Racer::find_path` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RacerResult {
    pub path: Path,
    pub duration: Duration,
}

/// Validates a candidate `(origin, destination)` pair, then races the
/// crawler against a caller-supplied deadline.
pub struct Racer<S> {
    source: Arc<S>,
}

impl<S> Racer<S>
where
    S: PageSource + Validator + Send + Sync + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        Racer { source }
    }

    /// Finds a chain of links from `origin` to `destination`, or fails with
    /// one of [`RacerError`]'s four kinds.
    ///
    /// `deadline` bounds the whole operation, not just the network calls:
    /// once it elapses the in-flight crawl is cancelled and
    /// [`RacerError::DestinationUnreachable`] is returned, mirroring what a
    /// crawl that genuinely exhausted the graph would report.
    pub async fn find_path(&self, deadline: Duration, origin: &str, destination: &str) -> Result<RacerResult, RacerError> {
        self.source.validate(origin, destination).await?;

        if origin == destination {
            return Ok(RacerResult { path: Path::new(origin), duration: Duration::ZERO });
        }

        let crawler = Arc::new(Crawler::new(self.source.clone()));
        let (mut paths_rx, mut errors_rx) = crawler.clone().crawl(origin.to_string(), destination.to_string());

        let start = Instant::now();
        let outcome = tokio::time::timeout(deadline, async {
            loop {
                tokio::select! {
                    path = paths_rx.recv() => {
                        if let Some(path) = path {
                            return Ok(path);
                        }
                    }
                    err = errors_rx.recv() => {
                        match err {
                            Some(CrawlError::ServerError(msg)) => return Err(RacerError::ServerError(msg)),
                            Some(CrawlError::DestinationUnreachable { destination }) => {
                                return Err(RacerError::DestinationUnreachable { destination });
                            }
                            None => {}
                        }
                    }
                }
            }
        })
        .await;

        crawler.cancel();

        match outcome {
            Ok(Ok(path)) => Ok(RacerResult { path, duration: start.elapsed() }),
            Ok(Err(err)) => Err(err),
            Err(_) => {
                event!(Level::DEBUG, origin, destination, "racer deadline elapsed before a path was found");
                Err(RacerError::DestinationUnreachable { destination: destination.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use provider::FixtureWiki;

    use super::Racer;
    use crate::error::RacerError;

    #[tokio::test]
    async fn test_find_path_direct_link() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let result = racer
            .find_path(Duration::from_secs(5), "Mike Tyson", "Alexander the Great")
            .await
            .unwrap();
        assert_eq!(result.path.as_slice(), &["Mike Tyson".to_string(), "Alexander the Great".to_string()]);
    }

    #[tokio::test]
    async fn test_find_path_same_origin_and_destination() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let result = racer.find_path(Duration::from_secs(5), "Mike Tyson", "Mike Tyson").await.unwrap();
        assert_eq!(result.path.as_slice(), &["Mike Tyson".to_string()]);
        assert_eq!(result.duration, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_find_path_rejects_empty_input() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let err = racer.find_path(Duration::from_secs(5), "", "Mike Tyson").await.unwrap_err();
        assert!(matches!(err, RacerError::InvalidEmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_find_path_rejects_unknown_destination() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let err = racer.find_path(Duration::from_secs(5), "Mike Tyson", "123456789").await.unwrap_err();
        assert!(matches!(err, RacerError::PageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_path_rejects_unknown_origin() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let err = racer.find_path(Duration::from_secs(5), "123456789", "Mike Tyson").await.unwrap_err();
        assert!(matches!(err, RacerError::PageNotFound { title } if title == "123456789"));
    }

    #[tokio::test]
    async fn test_find_path_follows_chain_through_multiple_pages() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let result = racer
            .find_path(Duration::from_secs(5), "Mike Tyson", "Małpka Express")
            .await
            .unwrap();
        assert_eq!(result.path.as_slice().first().unwrap(), "Mike Tyson");
        assert_eq!(result.path.last(), "Małpka Express");
    }

    #[tokio::test]
    async fn test_find_path_accepts_either_shortest_route_to_vancouver() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let result = racer.find_path(Duration::from_secs(5), "Mike Tyson", "Vancouver").await.unwrap();

        let via_greek = ["Mike Tyson", "Alexander the Great", "Greek language", "Fruit anatomy", "Segment", "Vancouver"];
        let via_olympics = ["Mike Tyson", "1984 Summer Olympics", "7-Eleven", "Big C", "Vancouver"];
        let titles: Vec<&str> = result.path.as_slice().iter().map(String::as_str).collect();
        assert!(
            titles == via_greek || titles == via_olympics,
            "unexpected path: {}",
            result.path,
        );
    }

    #[tokio::test]
    async fn test_find_path_reports_destination_unreachable() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let err = racer
            .find_path(Duration::from_secs(5), "Afghanistan", "Michael Jordan")
            .await
            .unwrap_err();
        assert!(matches!(err, RacerError::DestinationUnreachable { destination } if destination == "Michael Jordan"));
    }

    #[tokio::test]
    async fn test_find_path_times_out_as_destination_unreachable() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let racer = Racer::new(wiki);
        let err = racer
            .find_path(Duration::from_nanos(1), "Mike Tyson", "Segment")
            .await
            .unwrap_err();
        assert!(matches!(err, RacerError::DestinationUnreachable { destination } if destination == "Segment"));
    }
}
