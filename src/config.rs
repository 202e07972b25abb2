use crate::errors::CrawlError;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for one crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Listing page to start from
    #[serde(default)]
    pub start_url: String,

    /// Start URLs must begin with this prefix (no restriction when `None`)
    #[serde(default = "default_allowed_prefix")]
    pub allowed_prefix: Option<String>,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// How many times an action is re-resolved after its node went stale
    #[serde(default = "default_stale_retries")]
    pub stale_retries: u32,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub selectors: SiteSelectors,
}

/// Wait bounds and settle delays, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound for expanding an item's detail panel
    pub expand_ms: u64,
    /// Bound for each best-effort filter step and the confirm control
    pub filter_ms: u64,
    /// Bound for the offer list to appear
    pub offers_ms: u64,
    /// Pause after confirming, before classifying the result
    pub settle_ms: u64,
    /// Pause after the first page load
    pub initial_load_ms: u64,
    /// Pause after clicking "load more"
    pub load_more_ms: u64,
    /// Pause after each backward navigation
    pub back_ms: u64,
    /// Pause after following an option into its sub-view
    pub navigate_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            expand_ms: 10_000,
            filter_ms: 10_000,
            offers_ms: 5_000,
            settle_ms: 2_000,
            initial_load_ms: 5_000,
            load_more_ms: 1_000,
            back_ms: 1_000,
            navigate_ms: 2_000,
        }
    }
}

impl Timeouts {
    pub fn expand(&self) -> Duration {
        Duration::from_millis(self.expand_ms)
    }

    pub fn filter(&self) -> Duration {
        Duration::from_millis(self.filter_ms)
    }

    pub fn offers(&self) -> Duration {
        Duration::from_millis(self.offers_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn initial_load(&self) -> Duration {
        Duration::from_millis(self.initial_load_ms)
    }

    pub fn load_more(&self) -> Duration {
        Duration::from_millis(self.load_more_ms)
    }

    pub fn back(&self) -> Duration {
        Duration::from_millis(self.back_ms)
    }

    pub fn navigate(&self) -> Duration {
        Duration::from_millis(self.navigate_ms)
    }

    /// Same bound for every wait and no settle pauses; handy for scripted sessions
    pub fn uniform(wait_ms: u64) -> Self {
        Self {
            expand_ms: wait_ms,
            filter_ms: wait_ms,
            offers_ms: wait_ms,
            settle_ms: 0,
            initial_load_ms: 0,
            load_more_ms: 0,
            back_ms: 0,
            navigate_ms: 0,
        }
    }
}

/// One click in the best-effort filter sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStep {
    /// Human readable name used in logs and error reports
    pub name: String,
    pub selector: Selector,
    /// When set, the step is a toggle: it is only clicked if this
    /// attribute is not already `"true"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle_attribute: Option<String>,
}

impl FilterStep {
    fn click(name: &str, selector: Selector) -> Self {
        Self {
            name: name.to_string(),
            selector,
            toggle_attribute: None,
        }
    }
}

/// Site-specific selectors. Defaults target the cruise search results page
/// the crawler was built for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub tile: Selector,
    pub title: Selector,
    pub category: Selector,
    pub vehicle: Selector,
    pub price: Selector,
    pub load_more: Selector,
    /// Per-tile control that expands the detail panel
    pub expand_control: Selector,
    /// Attribute on the expand control reporting the expanded state
    pub expanded_attribute: String,
    pub option_label: Selector,
    pub option_action: Selector,
    pub filter_steps: Vec<FilterStep>,
    pub confirm: Selector,
    pub error_indicator: Selector,
    pub offer_container: Selector,
    pub offer: Selector,
    pub offer_label: Selector,
    pub offer_price: Selector,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            tile: Selector::test_id("div", "tripTile"),
            title: Selector::test_id("h2", "itinerary-title"),
            category: Selector::prefix("span", "data-testid", "cg-region_"),
            vehicle: Selector::prefix("div", "data-testid", "cg-ship_"),
            price: Selector::test_id("div", "priceAmount"),
            load_more: Selector::test_id("button", "loadMoreResults"),
            expand_control: Selector::contains("button", "data-testid", "showDates_"),
            expanded_attribute: "aria-expanded".to_string(),
            option_label: Selector::contains("div", "class", "dates-cell-style__Days"),
            option_action: Selector::test_id("a", "selectSailingDateButton"),
            filter_steps: vec![
                FilterStep::click(
                    "continue to specials",
                    Selector::test_id("button", "cabinsPanel2021Continue"),
                ),
                FilterStep {
                    name: "accessible room toggle".to_string(),
                    selector: Selector::test_id("input", "accessibilityToggleButton.0Collapse"),
                    toggle_attribute: Some("aria-checked".to_string()),
                },
                FilterStep::click(
                    "fully accessible cabin",
                    Selector::text("label", "Fully Accessible Cabin"),
                ),
                FilterStep::click(
                    "continue to room type",
                    Selector::test_id("button", "qualifiersPanelNextLink"),
                ),
            ],
            confirm: Selector::test_id("button", "accessibilityConfirmationContinueButton"),
            error_indicator: Selector::test_id("div", "bookingErrorContainer"),
            offer_container: Selector::test_id("div", "meta2022SliderContainer"),
            offer: Selector::test_id("div", "metaButton2022"),
            offer_label: Selector::test_id("div", "metaLabel"),
            offer_price: Selector::test_id("div", "fromPriceLabel"),
        }
    }
}

/// Default start URL prefix
fn default_allowed_prefix() -> Option<String> {
    Some("https://www.carnival.com/".to_string())
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// One re-resolution after a stale node
fn default_stale_retries() -> u32 {
    1
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            allowed_prefix: default_allowed_prefix(),
            webdriver_url: default_webdriver_url(),
            stale_retries: default_stale_retries(),
            timeouts: Timeouts::default(),
            selectors: SiteSelectors::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| CrawlError::Config(format!("{}: {}", path.display(), e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CrawlError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        serde_json::from_str(json).map_err(|e| CrawlError::Config(e.to_string()))
    }
}
