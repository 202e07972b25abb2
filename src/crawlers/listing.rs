use crate::dedup::DedupStore;
use crate::errors::CrawlError;
use crate::parsers::{ExtractionAdapter, Snapshot};
use crate::results::{ListingBatch, ListingItem, NumberedItem, PaginationState};

/// What one round found
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// Items never seen before this round, numbered, in document order
    pub new_items: ListingBatch,
    pub pagination: PaginationState,
    /// Every tile on the page in document order; `None` where the tile
    /// could not be read. Positions here match the page's expand controls.
    pub visible: Vec<Option<ListingItem>>,
}

/// Merges successive renders of the listing into one de-duplicated,
/// numbered sequence.
pub struct ListingCrawler<'a> {
    adapter: &'a dyn ExtractionAdapter,
    seen: DedupStore,
    next_number: usize,
    rounds: usize,
}

impl<'a> ListingCrawler<'a> {
    pub fn new(adapter: &'a dyn ExtractionAdapter) -> Self {
        Self {
            adapter,
            seen: DedupStore::new(),
            next_number: 1,
            rounds: 0,
        }
    }

    pub fn seen(&self) -> &DedupStore {
        &self.seen
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Extracts the snapshot's tiles and keeps the ones not seen before.
    ///
    /// An empty page means the listing did not load and is terminal.
    pub fn run_round(&mut self, snapshot: &Snapshot) -> Result<RoundOutcome, CrawlError> {
        self.rounds += 1;

        let visible: Vec<Option<ListingItem>> = self
            .adapter
            .listing_items(snapshot)
            .into_iter()
            .map(|parsed| match parsed {
                Ok(item) => Some(item),
                Err(e) => {
                    ::log::warn!("Skipping listing tile: {}", e);
                    None
                }
            })
            .collect();

        if visible.iter().all(Option::is_none) {
            ::log::error!("No listing items found in round {}", self.rounds);
            return Err(CrawlError::NoDataFound);
        }

        let mut new_items = Vec::new();
        for item in visible.iter().flatten() {
            let id = item.identity();
            if self.seen.contains(&id) {
                continue;
            }
            self.seen.add(id);
            new_items.push(NumberedItem {
                number: self.next_number,
                item: item.clone(),
            });
            self.next_number += 1;
        }

        let pagination = self.adapter.pagination(snapshot);
        ::log::info!(
            "Round {}: {} tiles, {} new, {} seen in total, {:?}",
            self.rounds,
            visible.len(),
            new_items.len(),
            self.seen.len(),
            pagination
        );

        Ok(RoundOutcome {
            new_items,
            pagination,
            visible,
        })
    }
}
