//! The concurrent, single-shot link crawl.

use std::collections::HashMap;
use std::sync::Arc;

use provider::{Page, PageSource};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CrawlError;
use crate::path::Path;
use crate::visited::VisitedSet;

const MAX_TITLES_PER_BATCH: usize = provider::http::MAX_TITLES_PER_BATCH;

/// Runs one crawl from an origin toward a destination over a shared
/// `PageSource`, breadth-first, fanning each frontier round out across
/// batched `fetch` calls.
///
/// A `Crawler` is single-shot: [`Crawler::crawl`] consumes `self` and spawns
/// the whole search as one task. Dropping the returned receivers, or calling
/// [`Crawler::cancel`] on the handle kept by the caller, tears the search down
/// cooperatively at the next batch boundary.
pub struct Crawler<S> {
    source: Arc<S>,
    visited: VisitedSet,
    cancel: CancellationToken,
}

impl<S> Crawler<S>
where
    S: PageSource + Send + Sync + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        Crawler {
            source,
            visited: VisitedSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stops the crawl at the next safe point. Already in-flight `fetch`
    /// calls are allowed to finish; no new batches are spawned afterward.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The set of titles queued for expansion so far. Exposed mainly so
    /// callers (and tests) can confirm that every title on a winning path was
    /// recorded in the visited set by the time the crawl concludes.
    pub async fn has_visited(&self, title: &str) -> bool {
        self.visited.contains(title).await
    }

    /// Starts the crawl and returns a rendezvous channel for the first path
    /// found (capacity 1: there is only ever one winner) plus an unbounded
    /// channel of non-fatal errors encountered along the way.
    pub fn crawl(self: Arc<Self>, origin: String, destination: String) -> (mpsc::Receiver<Path>, mpsc::UnboundedReceiver<CrawlError>) {
        let (paths_tx, paths_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            self.run(origin, destination, paths_tx, errors_tx).await;
        });

        (paths_rx, errors_rx)
    }

    async fn run(
        self: Arc<Self>,
        origin: String,
        destination: String,
        paths_tx: mpsc::Sender<Path>,
        errors_tx: mpsc::UnboundedSender<CrawlError>,
    ) {
        self.visited.try_visit(&origin).await;
        let mut frontier = vec![Path::new(origin)];

        while !frontier.is_empty() {
            if self.cancel.is_cancelled() {
                return;
            }

            let mut join_set = JoinSet::new();
            for batch in frontier.chunks(MAX_TITLES_PER_BATCH) {
                let titles: Vec<String> = batch.iter().map(|p| p.last().to_string()).collect();
                let batch_paths = batch.to_vec();
                let source = self.source.clone();
                let cancel = self.cancel.clone();
                join_set.spawn(async move {
                    let result = fetch_batch(&source, &titles, &cancel).await;
                    (batch_paths, result)
                });
            }

            let mut next_frontier = Vec::new();
            while let Some(joined) = join_set.join_next().await {
                let (batch_paths, result) = match joined {
                    Ok(v) => v,
                    Err(join_err) => {
                        warn!(error = %join_err, "crawl batch task failed to join");
                        continue;
                    }
                };

                let (pages_by_title, missing) = match result {
                    Ok(v) => v,
                    Err(err) => {
                        let _ = errors_tx.send(CrawlError::from(err));
                        continue;
                    }
                };

                if let Some(title) = missing {
                    if title == destination {
                        // the destination was validated to exist before the crawl
                        // started; a later "missing" report for it is an upstream
                        // inconsistency worth surfacing rather than a normal dead end.
                        let _ = errors_tx.send(CrawlError::ServerError(format!(
                            "destination page reported missing mid-crawl: {title}"
                        )));
                    } else {
                        debug!(title = %title, "page not found during crawl");
                    }
                }

                for path in batch_paths {
                    let Some(page) = pages_by_title.get(path.last()) else {
                        continue;
                    };
                    for link in &page.links {
                        if link == &destination {
                            let _ = self.visited.try_visit(link).await;
                            let found = path.fork_extend(link.clone());
                            // the channel has capacity 1: whichever task's send
                            // lands first wins. A losing task races its send
                            // against cancellation instead of blocking forever.
                            tokio::select! {
                                _ = self.cancel.cancelled() => {}
                                res = paths_tx.send(found) => {
                                    if res.is_ok() {
                                        self.cancel.cancel();
                                    }
                                }
                            }
                            return;
                        }
                        if self.visited.try_visit(link).await {
                            next_frontier.push(path.fork_extend(link.clone()));
                        }
                    }
                }
            }

            frontier = next_frontier;
        }

        let _ = errors_tx.send(CrawlError::DestinationUnreachable { destination });
    }
}

/// Fetches every title in `titles` as one logical batch, following
/// `plcontinue` tokens until the upstream has no more links left to deliver
/// for this batch.
async fn fetch_batch<S>(
    source: &Arc<S>,
    titles: &[String],
    cancel: &CancellationToken,
) -> Result<(HashMap<String, Page>, Option<String>), provider::PageSourceError>
where
    S: PageSource + ?Sized,
{
    let mut pages_by_title: HashMap<String, Page> = HashMap::new();
    let mut missing = None;
    let mut continuation: Option<String> = None;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let outcome = source.fetch(titles, continuation.as_deref(), cancel).await?;
        for page in outcome.pages {
            pages_by_title
                .entry(page.title.clone())
                .and_modify(|existing| existing.links.extend(page.links.clone()))
                .or_insert(page);
        }
        if missing.is_none() {
            if let Some(provider::PageSourceError::PageNotFound { title }) = outcome.err {
                missing = Some(title);
            }
        }

        match outcome.next {
            Some(next) => continuation = Some(next),
            None => break,
        }
    }

    Ok((pages_by_title, missing))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use provider::FixtureWiki;

    use super::Crawler;

    #[tokio::test]
    async fn test_crawl_finds_direct_link() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let crawler = Arc::new(Crawler::new(wiki));
        let (mut paths, _errors) = crawler.crawl("Mike Tyson".to_string(), "Alexander the Great".to_string());

        let found = tokio::time::timeout(Duration::from_secs(5), paths.recv())
            .await
            .expect("crawl should finish well within the timeout")
            .expect("a path should be found");
        assert_eq!(found.as_slice(), &["Mike Tyson".to_string(), "Alexander the Great".to_string()]);
    }

    #[tokio::test]
    async fn test_crawl_finds_multi_hop_path() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let crawler = Arc::new(Crawler::new(wiki));
        let (mut paths, _errors) = crawler.crawl("Mike Tyson".to_string(), "Segment".to_string());

        let found = tokio::time::timeout(Duration::from_secs(5), paths.recv())
            .await
            .expect("crawl should finish well within the timeout")
            .expect("a path should be found");
        assert_eq!(found.last(), "Segment");
        assert_eq!(found.as_slice().first().unwrap(), "Mike Tyson");
    }

    #[tokio::test]
    async fn test_crawl_reports_destination_unreachable() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let crawler = Arc::new(Crawler::new(wiki));
        let (mut paths, mut errors) = crawler.crawl("Afghanistan".to_string(), "Michael Jordan".to_string());

        let outcome = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::select! {
                path = paths.recv() => path.map(Ok),
                err = errors.recv() => err.map(Err),
            }
        })
        .await
        .expect("crawl should finish well within the timeout");

        assert!(matches!(
            outcome,
            Some(Err(crate::error::CrawlError::DestinationUnreachable { destination })) if destination == "Michael Jordan"
        ));
    }

    #[tokio::test]
    async fn test_winning_path_titles_are_all_visited() {
        let wiki = Arc::new(FixtureWiki::wikipedia_sample());
        let crawler = Arc::new(Crawler::new(wiki));
        let (mut paths, _errors) = crawler.clone().crawl("Mike Tyson".to_string(), "Segment".to_string());

        let found = tokio::time::timeout(Duration::from_secs(5), paths.recv())
            .await
            .expect("crawl should finish well within the timeout")
            .expect("a path should be found");

        for title in found.as_slice() {
            assert!(crawler.has_visited(title).await, "{title} should be recorded as visited");
        }
    }
}
