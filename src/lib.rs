// Re-export modules
pub mod config;
pub mod crawlers;
pub mod dedup;
pub mod errors;
pub mod parsers;
pub mod results;
pub mod selector;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for convenience
pub use config::CrawlConfig;
pub use crawlers::{Decision, DecisionSource, ScriptedDecisions, StdinDecisions};
pub use errors::CrawlError;
pub use results::{CrawlReport, InspectionReport, ListingItem, NumberedItem, OptionResult};

use parsers::SelectorAdapter;
use std::future::Future;
use std::path::Path;

/// Main builder for one crawl of a listing site
pub struct Crawl {
    config: CrawlConfig,
}

impl Crawl {
    /// Create a new Crawl builder starting at `start_url`
    pub fn new(start_url: &str) -> Self {
        Self {
            config: CrawlConfig::new(start_url),
        }
    }

    /// Replace the configuration, keeping the start URL if the new one has none
    pub fn with_config(mut self, mut config: CrawlConfig) -> Self {
        if config.start_url.is_empty() {
            config.start_url = std::mem::take(&mut self.config.start_url);
        }
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let config = CrawlConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Set the WebDriver endpoint
    pub fn with_webdriver_url(mut self, url: &str) -> Self {
        self.config.webdriver_url = url.to_string();
        self
    }

    /// Set how long to wait for a detail panel to expand
    pub fn with_expand_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.timeouts.expand_ms = timeout_seconds * 1000;
        self
    }

    /// Set how long to wait for an offer list to render
    pub fn with_offers_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.timeouts.offers_ms = timeout_seconds * 1000;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Connect to WebDriver and run the crawl until the operator stops it.
    ///
    /// The start URL is validated before any connection is made.
    pub async fn run<D, F>(self, decisions: &mut D, shutdown: F) -> Result<CrawlReport, CrawlError>
    where
        D: DecisionSource + ?Sized,
        F: Future<Output = ()>,
    {
        let mut config = self.config;
        utils::validate_start_url(&config.start_url, config.allowed_prefix.as_deref())?;

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        let adapter = SelectorAdapter::new(config.selectors.clone());
        let mut session = crawlers::WebDriverSession::connect(&config.webdriver_url).await?;
        crawlers::run_session(&mut session, &config, &adapter, decisions, shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let crawl = Crawl::new("https://www.carnival.com/cruise-search")
            .with_webdriver_url("http://localhost:9515")
            .with_expand_timeout(3)
            .with_offers_timeout(7);

        let config = crawl.config();
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert_eq!(config.timeouts.expand_ms, 3000);
        assert_eq!(config.timeouts.offers_ms, 7000);
    }

    #[test]
    fn test_with_config_keeps_start_url() {
        let mut config = CrawlConfig::default();
        config.stale_retries = 3;

        let crawl = Crawl::new("https://www.carnival.com/cruise-search").with_config(config);
        assert_eq!(crawl.config().start_url, "https://www.carnival.com/cruise-search");
        assert_eq!(crawl.config().stale_retries, 3);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_connecting() {
        let mut decisions = ScriptedDecisions::default();
        let err = Crawl::new("https://example.com/")
            .run(&mut decisions, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidInput(_)));
    }
}
