//! `PageSource` and `Validator` contracts for wikiracer, plus a live
//! MediaWiki implementation and an in-memory fixture for tests.

pub mod contract;
pub mod http;
#[cfg(feature = "fixture")]
pub mod fixture;

pub use contract::{FetchOutcome, Page, PageSource, PageSourceError, Validator, ValidatorError};
pub use http::HttpApiPageSource;
#[cfg(feature = "fixture")]
pub use fixture::FixtureWiki;
