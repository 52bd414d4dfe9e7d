//! Picks between the live MediaWiki `PageSource` and the in-memory fixture
//! wiki at startup, behind one concrete type the rest of `main` can hold
//! without reaching for a trait object.

use async_trait::async_trait;
use provider::{FetchOutcome, FixtureWiki, HttpApiPageSource, PageSource, PageSourceError, Validator, ValidatorError};
use tokio_util::sync::CancellationToken;

pub enum Source {
    Fixture(FixtureWiki),
    Live(HttpApiPageSource),
}

impl Source {
    pub fn fixture() -> Self {
        Source::Fixture(FixtureWiki::wikipedia_sample())
    }

    pub fn live(endpoint: &str, concurrency_limit: Option<usize>) -> Self {
        let mut client = HttpApiPageSource::new(endpoint);
        if let Some(limit) = concurrency_limit {
            client = client.with_concurrency_limit(limit);
        }
        Source::Live(client)
    }
}

#[async_trait]
impl PageSource for Source {
    async fn fetch(
        &self,
        titles: &[String],
        continuation: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, PageSourceError> {
        match self {
            Source::Fixture(wiki) => wiki.fetch(titles, continuation, cancel).await,
            Source::Live(client) => client.fetch(titles, continuation, cancel).await,
        }
    }
}

#[async_trait]
impl Validator for Source {
    async fn validate(&self, origin: &str, destination: &str) -> Result<(), ValidatorError> {
        match self {
            Source::Fixture(wiki) => wiki.validate(origin, destination).await,
            Source::Live(client) => client.validate(origin, destination).await,
        }
    }
}
