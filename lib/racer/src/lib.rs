//! Concurrent link-crawling engine that races from an origin page to a
//! destination page over a pluggable [`provider::PageSource`].

mod crawler;
mod error;
mod path;
mod racer;
mod visited;

pub use crawler::Crawler;
pub use error::{CrawlError, RacerError};
pub use path::Path;
pub use racer::{Racer, RacerResult};
pub use visited::VisitedSet;
