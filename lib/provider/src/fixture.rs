//! In-memory fixture wiki, used by integration tests and by
//! `wikiracer-server --fixture` for local smoke-testing without network access.
//!
//! The page graph mirrors the end-to-end scenarios from `spec.md` §8.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::contract::{FetchOutcome, Page, PageSource, PageSourceError, Validator, ValidatorError};

/// An in-memory link graph plus a per-title "page size" for links, letting
/// tests exercise the `plcontinue` pagination loop without a real server.
#[derive(Debug, Clone)]
pub struct FixtureWiki {
    links: HashMap<String, Vec<String>>,
    known: HashSet<String>,
    page_size: HashMap<String, usize>,
}

impl FixtureWiki {
    /// The wiki fixture used throughout `spec.md` §8's end-to-end scenarios.
    pub fn wikipedia_sample() -> Self {
        let mut wiki = FixtureWiki::new();
        wiki.add_page("Mike Tyson", &["Alexander the Great", "1984 Summer Olympics"]);
        wiki.add_page("Alexander the Great", &["Apepi", "Greek language", "Diodotus I"]);
        wiki.add_page("Greek language", &["Fruit anatomy"]);
        wiki.add_page("Fruit anatomy", &["Segment"]);
        wiki.add_page("Segment", &["Vancouver"]);
        wiki.add_page("1984 Summer Olympics", &["7-Eleven", "Afghanistan"]);
        wiki.add_page("7-Eleven", &["Big C", "Calgary", "Eurocash"]);
        wiki.add_page("Big C", &["Vancouver"]);
        wiki.add_page("Eurocash", &["Małpka Express", "Tea"]);
        wiki.add_page("Vancouver", &["2010 Winter Olympics"]);
        wiki.add_page("Afghanistan", &[]);
        wiki.add_page("Michael Jordan", &[]);
        // leaf pages referenced only as links, with no outbound links of their own.
        for leaf in ["Apepi", "Diodotus I", "Calgary", "Tea", "Małpka Express", "2010 Winter Olympics"] {
            wiki.known.insert(leaf.to_string());
        }
        wiki
    }

    pub fn new() -> Self {
        FixtureWiki {
            links: HashMap::new(),
            known: HashSet::new(),
            page_size: HashMap::new(),
        }
    }

    pub fn add_page(&mut self, title: &str, links: &[&str]) {
        self.known.insert(title.to_string());
        for l in links {
            self.known.insert(l.to_string());
        }
        self.links.insert(title.to_string(), links.iter().map(|s| s.to_string()).collect());
    }

    /// Force `fetch` to return at most `size` links per call for `title`,
    /// requiring the caller to follow `plcontinue` to see the rest.
    pub fn paginate(&mut self, title: &str, size: usize) {
        self.page_size.insert(title.to_string(), size);
    }

    fn id_for(&self, title: &str) -> u32 {
        // deterministic-ish id derived from insertion order isn't tracked;
        // a stable hash keeps ids consistent across calls without needing `&mut self`.
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        title.hash(&mut hasher);
        (hasher.finish() % u32::MAX as u64) as u32 + 1
    }
}

impl Default for FixtureWiki {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for FixtureWiki {
    async fn fetch(
        &self,
        titles: &[String],
        continuation: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<FetchOutcome, PageSourceError> {
        let mut pages = Vec::with_capacity(titles.len());
        let mut first_missing = None;
        // `plcontinue` here is encoded as `"<title>:<offset>"`, scoped to a
        // single title since a fixture batch in these tests is always size 1
        // when pagination is in play.
        let (continue_title, offset) = match continuation {
            Some(tok) => {
                let (t, o) = tok.split_once(':').unwrap_or((tok, "0"));
                (Some(t.to_string()), o.parse::<usize>().unwrap_or(0))
            }
            None => (None, 0),
        };

        for title in titles {
            if !self.known.contains(title) {
                if first_missing.is_none() {
                    first_missing = Some(title.clone());
                }
                continue;
            }
            let all_links = self.links.get(title).cloned().unwrap_or_default();
            let start = if continue_title.as_deref() == Some(title.as_str()) { offset } else { 0 };
            let page_size = self.page_size.get(title).copied().unwrap_or(all_links.len().max(1));
            let end = (start + page_size).min(all_links.len());
            let links = all_links.get(start..end).unwrap_or_default().to_vec();

            pages.push(Page {
                id: self.id_for(title),
                title: title.clone(),
                namespace: 0,
                links,
            });
        }

        // continuation only makes sense when exactly one title is being paged.
        let next = titles.iter().find_map(|title| {
            let all_links = self.links.get(title)?;
            let page_size = self.page_size.get(title).copied().unwrap_or(all_links.len().max(1));
            let start = if continue_title.as_deref() == Some(title.as_str()) { offset } else { 0 };
            let end = (start + page_size).min(all_links.len());
            if end < all_links.len() {
                Some(format!("{title}:{end}"))
            } else {
                None
            }
        });

        let err = first_missing.map(|title| PageSourceError::PageNotFound { title });
        Ok(FetchOutcome { pages, next, err })
    }
}

#[async_trait]
impl Validator for FixtureWiki {
    async fn validate(&self, origin: &str, destination: &str) -> Result<(), ValidatorError> {
        if origin.is_empty() || destination.is_empty() {
            return Err(ValidatorError::InvalidEmptyInput {
                origin: origin.to_string(),
                destination: destination.to_string(),
            });
        }
        if !self.known.contains(origin) {
            return Err(ValidatorError::PageNotFound { title: origin.to_string() });
        }
        if !self.known.contains(destination) {
            return Err(ValidatorError::PageNotFound { title: destination.to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_fetch_known_page() {
        let wiki = FixtureWiki::wikipedia_sample();
        let outcome = wiki.fetch(&["Mike Tyson".to_string()], None, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.pages.len(), 1);
        assert_eq!(outcome.pages[0].links, vec!["Alexander the Great", "1984 Summer Olympics"]);
        assert!(outcome.next.is_none());
        assert!(outcome.err.is_none());
    }

    #[tokio::test]
    async fn test_fetch_missing_page_reports_err_alongside_known_pages() {
        let wiki = FixtureWiki::wikipedia_sample();
        let outcome = wiki
            .fetch(&["Mike Tyson".to_string(), "123456789".to_string()], None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.pages.len(), 1);
        assert_eq!(outcome.pages[0].title, "Mike Tyson");
        assert_eq!(outcome.err, Some(PageSourceError::PageNotFound { title: "123456789".to_string() }));
    }

    #[tokio::test]
    async fn test_fetch_follows_continuation_token() {
        let mut wiki = FixtureWiki::wikipedia_sample();
        wiki.paginate("7-Eleven", 2);

        let first = wiki.fetch(&["7-Eleven".to_string()], None, &CancellationToken::new()).await.unwrap();
        assert_eq!(first.pages[0].links, vec!["Big C", "Calgary"]);
        let token = first.next.expect("partial page should carry a continuation token");

        let second = wiki.fetch(&["7-Eleven".to_string()], Some(&token), &CancellationToken::new()).await.unwrap();
        assert_eq!(second.pages[0].links, vec!["Eurocash"]);
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn test_validate_rejects_empty_input() {
        let wiki = FixtureWiki::wikipedia_sample();
        let err = wiki.validate("", "Mike Tyson").await.unwrap_err();
        assert!(matches!(err, ValidatorError::InvalidEmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_validate_rejects_unknown_destination() {
        let wiki = FixtureWiki::wikipedia_sample();
        let err = wiki.validate("Mike Tyson", "123456789").await.unwrap_err();
        assert_eq!(err, ValidatorError::PageNotFound { title: "123456789".to_string() });
    }

    #[tokio::test]
    async fn test_validate_accepts_known_pair() {
        let wiki = FixtureWiki::wikipedia_sample();
        assert!(wiki.validate("Mike Tyson", "Vancouver").await.is_ok());
    }
}
