//! Region frequency scraper
//!
//! Walks the monthly report index pages from the starting year onward and
//! counts sightings per region on each page. The first empty page ends the
//! walk; there is no fixed end year.

use chrono::NaiveDate;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

use super::fetcher::PageSource;
use super::ScrapeSummary;
use crate::config::ScrapeConfig;
use crate::error::{AppError, Result};
use crate::logger;
use crate::storage::dao;
use crate::storage::{Database, RegionFrequencyRecord, WriteOp, INTERNATIONAL_REGION};

const YEAR_PLACEHOLDER: &str = "::year";
const MONTH_PLACEHOLDER: &str = "::month";

/// Cells holding the state/province column of the report table
const REGION_CELL_SELECTOR: &str = "table tbody td:nth-child(3) font";

pub struct FrequencyScraper<'a, S> {
    source: &'a S,
    url_template: String,
    starting_year: i32,
    region_cells: Selector,
}

impl<'a, S: PageSource> FrequencyScraper<'a, S> {
    pub fn new(source: &'a S, config: &ScrapeConfig) -> Result<Self> {
        let region_cells = Selector::parse(REGION_CELL_SELECTOR)
            .map_err(|e| AppError::Parse(format!("selector '{REGION_CELL_SELECTOR}': {e}")))?;
        Ok(Self {
            source,
            url_template: config.frequency_url.clone(),
            starting_year: config.starting_year,
            region_cells,
        })
    }

    /// One insert per scraped month, stopping at the first empty page
    pub async fn collect(&self) -> Result<Vec<WriteOp<RegionFrequencyRecord>>> {
        let mut operations = Vec::new();
        let mut year = self.starting_year;

        'years: loop {
            for month in 1..=12u32 {
                let url = page_url(&self.url_template, year, month);
                let html = self.source.fetch(&url).await?;
                if html.is_empty() {
                    logger::log_info(&format!("No report page for {year}-{month:02}, scrape complete"));
                    break 'years;
                }

                let month_year = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| AppError::Parse(format!("invalid month {year}-{month}")))?;
                operations.push(WriteOp::InsertOne(RegionFrequencyRecord {
                    month_year,
                    region_frequency_map: self.count_regions(&html),
                }));
            }
            year += 1;
        }

        Ok(operations)
    }

    /// Scrape every month and replace the stored collection
    pub async fn run(&self, db: &Database) -> Result<ScrapeSummary> {
        let operations = self.collect().await?;
        let scraped = operations.len();
        let (deleted, inserted) = dao::replace_all(db, operations).await?;
        Ok(ScrapeSummary {
            scraped,
            deleted: deleted.deleted,
            inserted: inserted.inserted,
        })
    }

    /// Sightings per region on one report page; blank cells count as international
    pub fn count_regions(&self, html: &str) -> BTreeMap<String, u32> {
        let document = Html::parse_document(html);
        let mut counts = BTreeMap::new();
        for cell in document.select(&self.region_cells) {
            let text = cell.text().collect::<String>();
            let region = match text.trim() {
                "" => INTERNATIONAL_REGION.to_string(),
                region => region.to_string(),
            };
            *counts.entry(region).or_insert(0) += 1;
        }
        counts
    }
}

/// Report URL for a year and 1-based month
pub fn page_url(template: &str, year: i32, month: u32) -> String {
    template
        .replace(YEAR_PLACEHOLDER, &year.to_string())
        .replace(MONTH_PLACEHOLDER, &format!("{month:02}"))
}
