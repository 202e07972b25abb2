use crate::errors::CrawlError;
use crate::selector::{ActionKind, Condition, Locator};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Interval between probes while waiting for a condition
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The single live document the crawl drives.
///
/// Every locator is resolved against the document as it is at the time of
/// the call. Implementations must not cache node references, in particular
/// not across `navigate_back()`, which rebuilds the document.
#[async_trait]
pub trait DocumentSession: Send {
    async fn fetch(&mut self, url: &str) -> Result<(), CrawlError>;

    async fn current_url(&mut self) -> Result<String, CrawlError>;

    async fn navigate_back(&mut self) -> Result<(), CrawlError>;

    /// Evaluates a condition once, without waiting
    async fn probe(&mut self, condition: &Condition) -> Result<bool, CrawlError>;

    async fn act(&mut self, locator: &Locator, action: ActionKind) -> Result<(), CrawlError>;

    /// Number of nodes the locator currently resolves to
    async fn count(&mut self, locator: &Locator) -> Result<usize, CrawlError>;

    async fn read_text(&mut self, locator: &Locator) -> Result<String, CrawlError>;

    async fn read_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, CrawlError>;

    /// Serialized document, for snapshot extraction
    async fn source(&mut self) -> Result<String, CrawlError>;

    /// Releases the session. Called exactly once, on every exit path.
    async fn close(&mut self) -> Result<(), CrawlError>;

    /// Polls `condition` until it holds or `timeout` elapses.
    ///
    /// Returns `Ok(false)` on timeout. Transient lookup failures while
    /// polling count as "not yet"; any other error ends the wait.
    async fn wait_until(
        &mut self,
        condition: &Condition,
        timeout: Duration,
    ) -> Result<bool, CrawlError> {
        let start = Instant::now();
        loop {
            match self.probe(condition).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) if e.is_transient() => {
                    ::log::trace!("Probe hit a transient error: {}", e);
                }
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(false);
            }
            sleep(POLL_INTERVAL.min(timeout - elapsed)).await;
        }
    }
}
