//! Scrape module
//!
//! Pulls sighting reports and census figures from the web and replaces the
//! stored collections with the results.

pub mod census;
pub mod fetcher;
pub mod frequency;

pub use census::CensusScraper;
pub use fetcher::{HttpPageSource, PageSource};
pub use frequency::FrequencyScraper;

/// Outcome of one scrape run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Operations produced by the scan
    pub scraped: usize,
    /// Records removed before the insert
    pub deleted: u64,
    pub inserted: u64,
}
