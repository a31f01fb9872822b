//! Web scrapers for boxer profile data

pub mod category;
pub mod profile;

use std::time::Duration;

use crate::{Result, RingsideError, ScrapeConfig};

/// Blocking HTTP client with a fixed timeout and a politeness delay
///
/// A fetch failure is a per-page event: callers log it and move on to the
/// next page rather than aborting the batch. There is deliberately no retry.
pub struct PageClient {
    client: reqwest::blocking::Client,
    delay: Duration,
}

impl PageClient {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(PageClient {
            client,
            delay: Duration::from_millis(config.delay_ms),
        })
    }

    /// Fetch a page body, treating non-success statuses as fetch failures
    pub fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("Fetching {}", url);
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(RingsideError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        Ok(response.text()?)
    }

    /// Sleep out the inter-request delay the source asks of crawlers
    pub fn pause(&self) {
        std::thread::sleep(self.delay);
    }
}
