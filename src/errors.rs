use std::time::Duration;
use thiserror::Error;

/// Every failure the crawl can observe, classified by how far it propagates.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CrawlError {
    /// Malformed or disallowed start URL; the crawl never starts
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A round extracted zero listing items
    #[error("no listing items found on the page")]
    NoDataFound,

    /// A node disappeared between resolution and use
    #[error("element not available: {0}")]
    TransientElement(String),

    /// A bounded wait expired
    #[error("timed out after {timeout:?} waiting for {step}")]
    StepTimeout { step: String, timeout: Duration },

    /// A single listing tile could not be read
    #[error("could not parse listing item: {0}")]
    ItemParse(String),

    /// External interrupt
    #[error("interrupted by user")]
    UserAbort,

    /// WebDriver connection or command failure
    #[error("session error: {0}")]
    Session(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl CrawlError {
    /// Soft failures degrade a single result; everything else ends the run
    /// when it reaches the outer loop.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            CrawlError::TransientElement(_) | CrawlError::StepTimeout { .. } | CrawlError::ItemParse(_)
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CrawlError::TransientElement(_))
    }

    pub fn timeout(step: impl Into<String>, timeout: Duration) -> Self {
        CrawlError::StepTimeout {
            step: step.into(),
            timeout,
        }
    }
}

impl From<fantoccini::error::CmdError> for CrawlError {
    fn from(error: fantoccini::error::CmdError) -> Self {
        if error.is_no_such_element() || error.is_stale_element_reference() {
            CrawlError::TransientElement(error.to_string())
        } else {
            CrawlError::Session(error.to_string())
        }
    }
}

impl From<fantoccini::error::NewSessionError> for CrawlError {
    fn from(error: fantoccini::error::NewSessionError) -> Self {
        CrawlError::Session(error.to_string())
    }
}
