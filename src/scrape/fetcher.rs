//! Remote page fetching
//!
//! A non-200 answer is reported as an empty body, which callers read as
//! "no more data". Only transport failures are errors.

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONNECTION};
use reqwest::StatusCode;
use std::time::Duration;

use crate::config::ScrapeConfig;
use crate::error::{AppError, Result};
use crate::logger;

/// Something that can hand back the body of a URL
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `PageSource` over HTTP
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| AppError::Fetch {
                url: String::new(),
                source,
            })?;

        Ok(Self { client })
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let shown = without_query(url);
        logger::log_info(&format!("Scraping HTML from {shown}"));

        let fetch_error = |source: reqwest::Error| AppError::Fetch {
            url: shown.to_string(),
            source: source.without_url(),
        };
        let response = self.client.get(url).send().await.map_err(fetch_error)?;

        if response.status() != StatusCode::OK {
            logger::log_debug(&format!("{shown} answered {}, treating as empty", response.status()));
            return Ok(String::new());
        }

        response.text().await.map_err(fetch_error)
    }
}

/// URL with its query string dropped; census queries carry the API key
fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_query_hides_api_key() {
        assert_eq!(
            without_query("http://api.census.gov/data/2010/sf1?get=P0010001&for=state:06&key=secret"),
            "http://api.census.gov/data/2010/sf1"
        );
        assert_eq!(
            without_query("http://www.nuforc.org/webreports/ndxe201501.html"),
            "http://www.nuforc.org/webreports/ndxe201501.html"
        );
    }
}
