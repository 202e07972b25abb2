use crate::config::CrawlConfig;
use crate::crawlers::decision::{Decision, DecisionSource, RoundSummary};
use crate::crawlers::listing::ListingCrawler;
use crate::crawlers::navigation::NavigationEngine;
use crate::crawlers::recovery::RecoveryController;
use crate::crawlers::session::DocumentSession;
use crate::errors::CrawlError;
use crate::parsers::{ExtractionAdapter, Snapshot};
use crate::results::{
    CrawlReport, InspectionReport, InspectionStatus, ListingItem, PaginationState,
};
use crate::selector::{ActionKind, Locator};
use std::future::Future;

/// Outer loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Fetching,
    Extracting,
    AwaitingDecision,
    LoadingMore,
    Inspecting,
    Done,
}

fn enter(phase: &mut CrawlPhase, next: CrawlPhase) {
    ::log::debug!("Crawl: {:?} -> {:?}", phase, next);
    *phase = next;
}

/// Runs a whole crawl against `session` and releases it afterwards.
///
/// `shutdown` resolving aborts the run with `UserAbort` while the page is
/// loading or the operator is deciding. The session is closed on every
/// exit path; a failure to close is only logged.
pub async fn run_session<S, D, F>(
    session: &mut S,
    config: &CrawlConfig,
    adapter: &dyn ExtractionAdapter,
    decisions: &mut D,
    shutdown: F,
) -> Result<CrawlReport, CrawlError>
where
    S: DocumentSession,
    D: DecisionSource + ?Sized,
    F: Future<Output = ()>,
{
    let outcome = crawl(session, config, adapter, decisions, shutdown).await;

    if let Err(e) = session.close().await {
        ::log::warn!("Failed to close browser session: {}", e);
    }

    match &outcome {
        Ok(report) => ::log::info!(
            "Crawl complete - {} items listed, {} inspected",
            report.items.len(),
            report.inspections.len()
        ),
        Err(e) => ::log::error!("Crawl ended: {}", e),
    }
    outcome
}

async fn crawl<S, D, F>(
    session: &mut S,
    config: &CrawlConfig,
    adapter: &dyn ExtractionAdapter,
    decisions: &mut D,
    shutdown: F,
) -> Result<CrawlReport, CrawlError>
where
    S: DocumentSession,
    D: DecisionSource + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut phase = CrawlPhase::Fetching;
    let mut report = CrawlReport::default();
    let mut crawler = ListingCrawler::new(adapter);

    ::log::info!("Fetching {}", config.start_url);
    tokio::select! {
        biased;
        _ = &mut shutdown => return Err(CrawlError::UserAbort),
        fetched = session.fetch(&config.start_url) => fetched?,
    }
    tokio::select! {
        biased;
        _ = &mut shutdown => return Err(CrawlError::UserAbort),
        _ = tokio::time::sleep(config.timeouts.initial_load()) => {}
    }

    loop {
        let source = tokio::select! {
            biased;
            _ = &mut shutdown => return Err(CrawlError::UserAbort),
            source = session.source() => source?,
        };

        enter(&mut phase, CrawlPhase::Extracting);
        let outcome = {
            let snapshot = Snapshot::parse(&source);
            crawler.run_round(&snapshot)?
        };
        report.items.extend(outcome.new_items.iter().cloned());

        enter(&mut phase, CrawlPhase::AwaitingDecision);
        let summary = RoundSummary {
            round: crawler.rounds(),
            new_items: &outcome.new_items,
            visible: outcome.visible.len(),
            pagination: outcome.pagination,
        };
        let decision = tokio::select! {
            biased;
            _ = &mut shutdown => return Err(CrawlError::UserAbort),
            decision = decisions.decide(&summary) => decision?,
        };
        ::log::debug!("Decision after round {}: {:?}", crawler.rounds(), decision);

        match decision {
            Decision::Continue if outcome.pagination == PaginationState::MoreAvailable => {
                enter(&mut phase, CrawlPhase::LoadingMore);
                match load_more(session, config).await {
                    Ok(()) => {}
                    Err(e) if e.is_soft() => ::log::warn!("Could not load more results: {}", e),
                    Err(e) => return Err(e),
                }
                enter(&mut phase, CrawlPhase::Fetching);
            }
            Decision::Continue | Decision::Stop => break,
            Decision::InspectOne(n) => {
                enter(&mut phase, CrawlPhase::Inspecting);
                let inspection = inspect_position(session, config, adapter, &outcome.visible, n).await?;
                report.inspections.push(inspection);
                break;
            }
            Decision::InspectRange(start, end) => {
                enter(&mut phase, CrawlPhase::Inspecting);
                let last = end.min(outcome.visible.len() + 1);
                if end > last {
                    ::log::warn!(
                        "Items {}-{} are out of range; only {} items are listed",
                        last + 1,
                        end,
                        outcome.visible.len()
                    );
                }
                for n in start..=last {
                    let inspection = inspect_position(session, config, adapter, &outcome.visible, n).await?;
                    report.inspections.push(inspection);
                }
                break;
            }
        }
    }

    enter(&mut phase, CrawlPhase::Done);
    Ok(report)
}

/// Reveals the next page of results
async fn load_more<S: DocumentSession>(session: &mut S, config: &CrawlConfig) -> Result<(), CrawlError> {
    let button = Locator::new(&config.selectors.load_more);
    let mut recovery = RecoveryController::new(session, config.stale_retries);

    recovery
        .wait_then_act("load more", &button, config.timeouts.expand(), ActionKind::Click)
        .await?;
    ::log::info!("Loading more results...");
    recovery.pause(config.timeouts.load_more()).await;
    Ok(())
}

/// Inspects the item at 1-based position `number` in the visible list.
///
/// A soft failure skips the item; anything else ends the run.
async fn inspect_position<S: DocumentSession>(
    session: &mut S,
    config: &CrawlConfig,
    adapter: &dyn ExtractionAdapter,
    visible: &[Option<ListingItem>],
    number: usize,
) -> Result<InspectionReport, CrawlError> {
    if number == 0 || number > visible.len() {
        ::log::warn!("Item number {} is out of range (1-{})", number, visible.len());
        return Ok(InspectionReport::out_of_range(number));
    }

    let item = visible[number - 1].clone();
    ::log::info!(
        "Inspecting item {}: {}",
        number,
        item.as_ref()
            .and_then(|i| i.title.as_deref())
            .unwrap_or("untitled")
    );

    let mut engine = NavigationEngine::new(session, config, adapter);
    match engine.inspect(number - 1).await {
        Ok(options) => Ok(InspectionReport {
            item_number: number,
            item,
            status: InspectionStatus::Completed,
            options,
        }),
        Err(e) if e.is_soft() => {
            ::log::warn!("Skipping item {}: {}", number, e);
            Ok(InspectionReport {
                item_number: number,
                item,
                status: InspectionStatus::Skipped(e.to_string()),
                options: Vec::new(),
            })
        }
        Err(e) => Err(e),
    }
}
