use crate::crawlers::session::DocumentSession;
use crate::errors::CrawlError;
use crate::selector::{ActionKind, Condition, Locator};
use std::time::Duration;

/// Wraps every interactive step in a bounded wait and a typed outcome.
///
/// Nothing here retries without a bound: waits end at their timeout and a
/// stale node is re-resolved at most `stale_retries` times.
pub struct RecoveryController<'s, S: DocumentSession> {
    session: &'s mut S,
    stale_retries: u32,
}

impl<'s, S: DocumentSession> RecoveryController<'s, S> {
    pub fn new(session: &'s mut S, stale_retries: u32) -> Self {
        Self {
            session,
            stale_retries,
        }
    }

    /// Direct access for steps that need no recovery policy
    pub fn session(&mut self) -> &mut S {
        self.session
    }

    /// Waits for `condition`, returning whether it held within `timeout`
    pub async fn wait(&mut self, condition: &Condition, timeout: Duration) -> Result<bool, CrawlError> {
        self.session.wait_until(condition, timeout).await
    }

    /// Waits for `condition` and maps a timeout to `StepTimeout`
    pub async fn require(
        &mut self,
        step: &str,
        condition: &Condition,
        timeout: Duration,
    ) -> Result<(), CrawlError> {
        if self.wait(condition, timeout).await? {
            Ok(())
        } else {
            ::log::debug!("Step '{}' timed out after {:?}", step, timeout);
            Err(CrawlError::timeout(step, timeout))
        }
    }

    /// Performs `action`, re-resolving the locator if its node went stale
    pub async fn act(&mut self, step: &str, locator: &Locator, action: ActionKind) -> Result<(), CrawlError> {
        let mut attempt = 0;
        loop {
            match self.session.act(locator, action).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.stale_retries => {
                    attempt += 1;
                    ::log::debug!("Step '{}' hit {}; re-resolving (attempt {})", step, e, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Waits until the locator is clickable, then performs `action`
    pub async fn wait_then_act(
        &mut self,
        step: &str,
        locator: &Locator,
        timeout: Duration,
        action: ActionKind,
    ) -> Result<(), CrawlError> {
        self.require(step, &Condition::Clickable(locator.clone()), timeout)
            .await?;
        self.act(step, locator, action).await
    }

    pub async fn count(&mut self, locator: &Locator) -> Result<usize, CrawlError> {
        self.session.count(locator).await
    }

    pub async fn read_text(&mut self, locator: &Locator) -> Result<String, CrawlError> {
        self.session.read_text(locator).await
    }

    pub async fn read_attribute(&mut self, locator: &Locator, name: &str) -> Result<Option<String>, CrawlError> {
        self.session.read_attribute(locator, name).await
    }

    /// Whether the locator currently resolves, without waiting
    pub async fn is_present(&mut self, locator: &Locator) -> Result<bool, CrawlError> {
        self.session.probe(&Condition::Present(locator.clone())).await
    }

    pub async fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
