use crate::crawlers::session::DocumentSession;
use crate::errors::CrawlError;
use crate::selector::{ActionKind, Condition, Locator};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};

/// Fallback WebDriver endpoints tried when the configured one refuses
const FALLBACK_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A browser tab driven over the WebDriver protocol
pub struct WebDriverSession {
    client: Client,
    closed: bool,
}

impl WebDriverSession {
    /// Connects to the WebDriver instance, falling back to common local ports
    pub async fn connect(webdriver_url: &str) -> Result<Self, CrawlError> {
        match ClientBuilder::native().connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self::from_client(client));
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            }
        }

        for url in FALLBACK_URLS.iter() {
            if *url == webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = ClientBuilder::native().connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self::from_client(client));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(CrawlError::Session(format!(
            "no WebDriver server reachable at {} or any fallback",
            webdriver_url
        )))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            closed: false,
        }
    }

    async fn resolve(&self, locator: &Locator) -> Result<Element, CrawlError> {
        let xpath = locator.to_xpath();
        self.client
            .find(fantoccini::Locator::XPath(&xpath))
            .await
            .map_err(CrawlError::from)
    }

    async fn resolve_all(&self, locator: &Locator) -> Result<Vec<Element>, CrawlError> {
        let xpath = locator.to_xpath();
        Ok(self
            .client
            .find_all(fantoccini::Locator::XPath(&xpath))
            .await?)
    }
}

#[async_trait]
impl DocumentSession for WebDriverSession {
    async fn fetch(&mut self, url: &str) -> Result<(), CrawlError> {
        ::log::debug!("GOTO: {}", url);
        Ok(self.client.goto(url).await?)
    }

    async fn current_url(&mut self) -> Result<String, CrawlError> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn navigate_back(&mut self) -> Result<(), CrawlError> {
        Ok(self.client.back().await?)
    }

    async fn probe(&mut self, condition: &Condition) -> Result<bool, CrawlError> {
        let found = match self.resolve(condition.locator()).await {
            Ok(element) => element,
            Err(CrawlError::TransientElement(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        match condition {
            Condition::Present(_) => Ok(true),
            Condition::Clickable(_) => Ok(found.is_displayed().await? && found.is_enabled().await?),
            Condition::AttributeEquals { name, value, .. } => {
                Ok(found.attr(name).await?.as_deref() == Some(value.as_str()))
            }
        }
    }

    async fn act(&mut self, locator: &Locator, action: ActionKind) -> Result<(), CrawlError> {
        let element = self.resolve(locator).await?;
        match action {
            ActionKind::Click => Ok(element.click().await?),
            ActionKind::Follow => {
                let href = element.attr("href").await?.ok_or_else(|| {
                    CrawlError::TransientElement(format!("{} has no href", locator.to_xpath()))
                })?;
                // Relative links resolve against the page they were found on
                let base = self.client.current_url().await?;
                let target = base
                    .join(&href)
                    .map_err(|e| CrawlError::Session(format!("bad link {}: {}", href, e)))?;
                ::log::debug!("FOLLOW: {}", target);
                Ok(self.client.goto(target.as_str()).await?)
            }
        }
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, CrawlError> {
        Ok(self.resolve_all(locator).await?.len())
    }

    async fn read_text(&mut self, locator: &Locator) -> Result<String, CrawlError> {
        let element = self.resolve(locator).await?;
        Ok(element.text().await?)
    }

    async fn read_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, CrawlError> {
        let element = self.resolve(locator).await?;
        Ok(element.attr(name).await?)
    }

    async fn source(&mut self) -> Result<String, CrawlError> {
        Ok(self.client.source().await?)
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(e) = self.client.clone().close().await {
            if e.to_string().contains("Unable to find session") {
                ::log::warn!("WebDriver session was already gone");
                return Ok(());
            }
            return Err(e.into());
        }
        ::log::debug!("WebDriver session closed");
        Ok(())
    }
}
