use crate::config::{CrawlConfig, FilterStep, SiteSelectors, Timeouts};
use crate::crawlers::recovery::RecoveryController;
use crate::crawlers::session::DocumentSession;
use crate::errors::CrawlError;
use crate::parsers::{ExtractionAdapter, Snapshot};
use crate::parsers::text::normalize_whitespace;
use crate::results::{NavigationSession, OptionResult};
use crate::selector::{ActionKind, Condition, Locator};

/// Where the engine is within one item's inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    Collapsed,
    Expanded,
    Navigated,
    FilterApplied,
    Confirmed,
    Extracted,
    ErrorDetected,
    ReturnedToList,
    Done,
}

/// Drives the inspect sub-workflow for one listing item at a time.
///
/// All per-option state is keyed by position. Every node is looked up
/// again when it is needed, because backward navigation rebuilds the
/// listing and collapses the detail panel.
pub struct NavigationEngine<'a, 's, S: DocumentSession> {
    recovery: RecoveryController<'s, S>,
    selectors: &'a SiteSelectors,
    timeouts: &'a Timeouts,
    adapter: &'a dyn ExtractionAdapter,
    state: NavigationSession,
    phase: NavPhase,
}

impl<'a, 's, S: DocumentSession> NavigationEngine<'a, 's, S> {
    pub fn new(session: &'s mut S, config: &'a CrawlConfig, adapter: &'a dyn ExtractionAdapter) -> Self {
        Self {
            recovery: RecoveryController::new(session, config.stale_retries),
            selectors: &config.selectors,
            timeouts: &config.timeouts,
            adapter,
            state: NavigationSession::default(),
            phase: NavPhase::Collapsed,
        }
    }

    pub fn state(&self) -> &NavigationSession {
        &self.state
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    /// Visits every nested option of the item at `item_index` (0-based).
    ///
    /// Returns one result per detected option, in index order. Fails only
    /// when the item's detail panel cannot be expanded in the first place.
    pub async fn inspect(&mut self, item_index: usize) -> Result<Vec<OptionResult>, CrawlError> {
        self.state = NavigationSession {
            item_index,
            ..NavigationSession::default()
        };
        self.enter(NavPhase::Collapsed);

        if let Err(e) = self.ensure_expanded().await {
            ::log::warn!("Could not expand item {}: {}", item_index + 1, e);
            self.state.last_error = Some(e.to_string());
            return Err(e);
        }

        let option_count = self.detect_option_count().await?;
        self.state.option_count = option_count;
        if option_count == 0 {
            ::log::info!("No options found for item {}", item_index + 1);
            self.collapse().await;
            self.enter(NavPhase::Done);
            return Ok(Vec::new());
        }
        ::log::info!("Found {} options for item {}", option_count, item_index + 1);

        let mut results = Vec::with_capacity(option_count);
        for option in 0..option_count {
            self.state.current_option = option;
            let (result, navigated) = self.visit_option(option).await;
            ::log::info!(
                "Option {}/{} ({}) available? {}",
                option + 1,
                option_count,
                result.date_label,
                result.available
            );
            results.push(result);

            if navigated {
                self.backtrack(option + 1 < option_count).await;
            }
        }

        self.enter(NavPhase::Done);
        Ok(results)
    }

    fn enter(&mut self, phase: NavPhase) {
        ::log::debug!(
            "Item {} option {}/{}: {:?} -> {:?}",
            self.state.item_index + 1,
            self.state.current_option + 1,
            self.state.option_count,
            self.phase,
            phase
        );
        self.phase = phase;
    }

    fn expand_control(&self) -> Locator {
        Locator::nth(&self.selectors.expand_control, self.state.item_index)
    }

    fn expanded_condition(&self) -> Condition {
        Condition::AttributeEquals {
            locator: self.expand_control(),
            name: self.selectors.expanded_attribute.clone(),
            value: "true".to_string(),
        }
    }

    /// Expands the item's detail panel unless the page already reports it expanded
    async fn ensure_expanded(&mut self) -> Result<(), CrawlError> {
        let control = self.expand_control();
        let expanded = self.expanded_condition();
        let timeout = self.timeouts.expand();

        self.recovery
            .require("expand control", &Condition::Clickable(control.clone()), timeout)
            .await?;
        let already_expanded = match self.recovery.session().probe(&expanded).await {
            Ok(state) => state,
            Err(e) if e.is_transient() => {
                ::log::debug!("Expanded state unreadable ({}); expanding", e);
                false
            }
            Err(e) => return Err(e),
        };
        if !already_expanded {
            self.recovery.act("expand", &control, ActionKind::Click).await?;
            self.recovery.require("expanded panel", &expanded, timeout).await?;
        }

        self.state.expanded = true;
        self.enter(NavPhase::Expanded);
        Ok(())
    }

    /// Closes a panel this engine opened, leaving the list as it was found
    async fn collapse(&mut self) {
        let expanded = self.expanded_condition();
        match self.recovery.session().probe(&expanded).await {
            Ok(true) => {
                let control = self.expand_control();
                if let Err(e) = self.recovery.act("collapse", &control, ActionKind::Click).await {
                    ::log::warn!("Could not collapse item {}: {}", self.state.item_index + 1, e);
                    return;
                }
            }
            Ok(false) => {}
            Err(e) => {
                ::log::warn!("Could not read expanded state: {}", e);
                return;
            }
        }
        self.state.expanded = false;
        self.enter(NavPhase::Collapsed);
    }

    /// Options valid for both the label list and the action list
    async fn detect_option_count(&mut self) -> Result<usize, CrawlError> {
        let labels = self.recovery.count(&Locator::new(&self.selectors.option_label)).await?;
        let actions = self.recovery.count(&Locator::new(&self.selectors.option_action)).await?;
        if labels != actions {
            ::log::warn!(
                "Item {} shows {} option labels but {} option links; using {}",
                self.state.item_index + 1,
                labels,
                actions,
                labels.min(actions)
            );
        }
        Ok(labels.min(actions))
    }

    /// Runs the per-option protocol. The flag reports whether the session
    /// left the listing view and needs to backtrack.
    async fn visit_option(&mut self, option: usize) -> (OptionResult, bool) {
        if let Err(e) = self.ensure_expanded().await {
            return (self.skip(option, "unknown date".to_string(), e), false);
        }

        let label = Locator::nth(&self.selectors.option_label, option);
        let action = Locator::nth(&self.selectors.option_action, option);

        let date_label = match self.recovery.read_text(&label).await {
            Ok(text) if !text.trim().is_empty() => normalize_whitespace(&text),
            Ok(_) => "unknown date".to_string(),
            Err(e) => {
                ::log::debug!("No label for option {}: {}", option + 1, e);
                "unknown date".to_string()
            }
        };

        match self.recovery.is_present(&action).await {
            Ok(true) => {}
            Ok(false) => {
                let e = CrawlError::TransientElement(format!("option {} link not found", option + 1));
                return (self.skip(option, date_label, e), false);
            }
            Err(e) => return (self.skip(option, date_label, e), false),
        }

        ::log::info!(
            "Checking option {}/{} ({})...",
            option + 1,
            self.state.option_count,
            date_label
        );
        if let Err(e) = self.recovery.act("follow option", &action, ActionKind::Follow).await {
            return (self.skip(option, date_label, e), false);
        }
        self.state.expanded = false;
        self.recovery.pause(self.timeouts.navigate()).await;
        self.enter(NavPhase::Navigated);

        let mut result = OptionResult::unavailable(date_label, None);

        let selectors = self.selectors;
        let mut filtered = true;
        for step in &selectors.filter_steps {
            if let Err(e) = self.apply_filter_step(step).await {
                ::log::warn!("Filter step '{}' failed: {}", step.name, e);
                result.error = Some(format!("{}: {}", step.name, e));
                filtered = false;
                break;
            }
        }

        if filtered {
            self.enter(NavPhase::FilterApplied);
            let confirm = Locator::new(&self.selectors.confirm);
            match self
                .recovery
                .wait_then_act("confirm", &confirm, self.timeouts.filter(), ActionKind::Click)
                .await
            {
                Ok(()) => {
                    self.recovery.pause(self.timeouts.settle()).await;
                    self.enter(NavPhase::Confirmed);
                    result.available = true;
                }
                Err(e) => {
                    ::log::warn!("Confirm failed: {}", e);
                    result.error = Some(format!("confirm: {}", e));
                }
            }
        }

        // The error indicator overrides anything the steps above concluded
        let indicator = Locator::new(&self.selectors.error_indicator);
        match self.recovery.is_present(&indicator).await {
            Ok(true) => {
                self.enter(NavPhase::ErrorDetected);
                result.available = false;
            }
            Ok(false) => {}
            Err(e) => ::log::debug!("Could not check error indicator: {}", e),
        }

        if result.available {
            self.extract_offers(&mut result).await;
        }

        self.state.last_error = result.error.clone();
        (result, true)
    }

    /// Best-effort click; a toggle already set is left alone
    async fn apply_filter_step(&mut self, step: &FilterStep) -> Result<(), CrawlError> {
        let target = Locator::new(&step.selector);
        self.recovery
            .require(&step.name, &Condition::Clickable(target.clone()), self.timeouts.filter())
            .await?;

        if let Some(attribute) = &step.toggle_attribute {
            if self.recovery.read_attribute(&target, attribute).await?.as_deref() == Some("true") {
                ::log::debug!("Filter step '{}' already set", step.name);
                return Ok(());
            }
        }
        self.recovery.act(&step.name, &target, ActionKind::Click).await
    }

    async fn extract_offers(&mut self, result: &mut OptionResult) {
        let container = Condition::Present(Locator::new(&self.selectors.offer_container));
        match self.recovery.wait(&container, self.timeouts.offers()).await {
            Ok(true) => {}
            Ok(false) => {
                ::log::info!("No offer list found for {}", result.date_label);
                return;
            }
            Err(e) => {
                ::log::warn!("Failed waiting for offer list: {}", e);
                return;
            }
        }

        let source = match self.recovery.session().source().await {
            Ok(source) => source,
            Err(e) => {
                ::log::warn!("Could not read offer page: {}", e);
                return;
            }
        };
        result.offers = {
            let snapshot = Snapshot::parse(&source);
            self.adapter.offers(&snapshot)
        };
        result.page_url = self.recovery.session().current_url().await.ok();
        self.enter(NavPhase::Extracted);
    }

    /// Returns to the listing and, if more options follow, re-opens the
    /// same item's panel by position
    async fn backtrack(&mut self, reestablish: bool) {
        for _ in 0..2 {
            if let Err(e) = self.recovery.session().navigate_back().await {
                ::log::warn!("Backward navigation failed: {}", e);
            }
            self.recovery.pause(self.timeouts.back()).await;
        }
        self.state.expanded = false;
        self.enter(NavPhase::ReturnedToList);

        if reestablish {
            if let Err(e) = self.ensure_expanded().await {
                ::log::warn!(
                    "Could not re-open item {} after returning: {}",
                    self.state.item_index + 1,
                    e
                );
                self.state.last_error = Some(e.to_string());
            }
        }
    }

    fn skip(&mut self, option: usize, date_label: String, error: CrawlError) -> OptionResult {
        ::log::warn!("Skipping option {} ({}): {}", option + 1, date_label, error);
        self.state.last_error = Some(error.to_string());
        OptionResult::unavailable(date_label, Some(error.to_string()))
    }
}
