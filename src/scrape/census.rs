//! Census population scraper
//!
//! Reads the pipe-delimited state reference table, then asks the census API
//! for each state's population.

use serde_json::Value;

use super::fetcher::PageSource;
use super::ScrapeSummary;
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::logger;
use crate::storage::dao;
use crate::storage::{CensusRecord, Database, WriteOp};

const CENSUS_CODE_PLACEHOLDER: &str = "{{censusCode}}";
const API_KEY_PLACEHOLDER: &str = "{{apiKey}}";

/// One row of the state reference table (`STATE|STUSAB|STATE_NAME|...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCode {
    pub census_code: String,
    pub postal_code: String,
    pub name: String,
}

/// Rows of the state table; the header line and blank lines are skipped
pub fn parse_state_codes(text: &str) -> Vec<StateCode> {
    text.lines()
        .skip(1)
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.split('|');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(code), Some(postal), Some(name)) => Some(StateCode {
                    census_code: code.trim().to_string(),
                    postal_code: postal.trim().to_string(),
                    name: name.trim().to_string(),
                }),
                _ => {
                    logger::log_warning(&format!("Skipping malformed state table line: {line}"));
                    None
                }
            }
        })
        .collect()
}

/// Population at `[1][0]` of a census API answer
///
/// The API returns the figure as a string; a bare number is accepted too.
/// Anything else means no usable figure.
pub fn parse_population(body: &str) -> Option<i64> {
    if body.trim().is_empty() {
        return None;
    }
    let parsed: Value = serde_json::from_str(body).ok()?;
    match parsed.get(1)?.get(0)? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

pub fn census_url(template: &str, census_code: &str, api_key: &str) -> String {
    template
        .replace(CENSUS_CODE_PLACEHOLDER, census_code)
        .replace(API_KEY_PLACEHOLDER, api_key)
}

pub struct CensusScraper<'a, S> {
    source: &'a S,
    config: &'a ScrapeConfig,
}

impl<'a, S: PageSource> CensusScraper<'a, S> {
    pub const fn new(source: &'a S, config: &'a ScrapeConfig) -> Self {
        Self { source, config }
    }

    /// One insert per state, population `None` when the API has no figure
    pub async fn collect(&self) -> Result<Vec<WriteOp<CensusRecord>>> {
        let table = self.source.fetch(&self.config.state_codes_url).await?;
        let states = parse_state_codes(&table);
        if states.is_empty() {
            logger::log_warning("State reference table was empty");
        }

        let mut operations = Vec::with_capacity(states.len());
        for state in states {
            let url = census_url(
                &self.config.census_api_url,
                &state.census_code,
                &self.config.census_api_key,
            );
            let body = self.source.fetch(&url).await?;
            let population = parse_population(&body);
            if population.is_none() {
                logger::log_warning(&format!(
                    "No population figure for {} ({})",
                    state.name, state.postal_code
                ));
            }

            operations.push(WriteOp::InsertOne(CensusRecord {
                region: state.name,
                postal_code: state.postal_code,
                census_code: state.census_code,
                population,
            }));
        }

        Ok(operations)
    }

    /// Scrape every state and replace the stored collection
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::Filter;
    use std::collections::HashMap;

    const STATE_TABLE: &str = "STATE|STUSAB|STATE_NAME|STATENS\r\n\
        06|CA|California|01779778\r\n\
        \r\n\
        72|PR|Puerto Rico|01779808\r\n\
        53|WA|Washington|01779804\r\n";

    struct FakeSource {
        pages: HashMap<String, String>,
    }

    impl PageSource for FakeSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            Ok(self.pages.get(url).cloned().unwrap_or_default())
        }
    }

    fn scrape_config() -> ScrapeConfig {
        let mut cfg = Config::load_from("does-not-exist").unwrap().scrape;
        cfg.state_codes_url = "http://census.test/state.txt".to_string();
        cfg.census_api_url = "http://census.test/api?for=state:{{censusCode}}&key={{apiKey}}".to_string();
        cfg.census_api_key = "secret".to_string();
        cfg
    }

    #[test]
    fn test_parse_state_codes() {
        let states = parse_state_codes(STATE_TABLE);
        assert_eq!(states.len(), 3);
        assert_eq!(
            states[0],
            StateCode {
                census_code: "06".to_string(),
                postal_code: "CA".to_string(),
                name: "California".to_string(),
            }
        );
        assert_eq!(states[2].postal_code, "WA");
    }

    #[test]
    fn test_parse_population() {
        assert_eq!(parse_population(r#"[["P0010001","state"],["37253956","06"]]"#), Some(37_253_956));
        assert_eq!(parse_population(r#"[["P0010001","state"],[705749,"53"]]"#), Some(705_749));
        assert_eq!(parse_population(""), None);
        assert_eq!(parse_population("<html>error</html>"), None);
        assert_eq!(parse_population(r#"[["P0010001","state"]]"#), None);
        assert_eq!(parse_population(r#"[["P0010001"],["n/a"]]"#), None);
    }

    #[test]
    fn test_census_url() {
        assert_eq!(
            census_url("x?for=state:{{censusCode}}&key={{apiKey}}", "06", "k"),
            "x?for=state:06&key=k"
        );
    }

    #[tokio::test]
    async fn test_run_keeps_states_without_population() {
        let config = scrape_config();
        let pages = HashMap::from([
            (config.state_codes_url.clone(), STATE_TABLE.to_string()),
            (
                census_url(&config.census_api_url, "06", "secret"),
                r#"[["P0010001","state"],["37253956","06"]]"#.to_string(),
            ),
            (
                census_url(&config.census_api_url, "53", "secret"),
                r#"[["P0010001","state"],["6724540","53"]]"#.to_string(),
            ),
        ]);
        let source = FakeSource { pages };
        let db = Database::in_memory();

        let summary = CensusScraper::new(&source, &config).run(&db).await.unwrap();
        assert_eq!(summary.scraped, 3);
        assert_eq!(summary.inserted, 3);

        let stored: Vec<CensusRecord> = db.read(&Filter::All, None).await.unwrap();
        let populations: HashMap<_, _> = stored
            .iter()
            .map(|r| (r.postal_code.as_str(), r.population))
            .collect();
        assert_eq!(populations["CA"], Some(37_253_956));
        assert_eq!(populations["PR"], None);
        assert_eq!(populations["WA"], Some(6_724_540));
    }
}
