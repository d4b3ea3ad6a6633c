//! Receiver-side helpers
//!
//! Scrapers report partial and full failures through [`ScrapeError`];
//! [`ScrapeErrors`] folds the errors of one scrape cycle into one.

pub mod scrape_error;

pub use scrape_error::{ScrapeError, ScrapeErrors, ScrapeResult};
