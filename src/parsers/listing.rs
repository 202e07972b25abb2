use crate::config::SiteSelectors;
use crate::errors::CrawlError;
use crate::parsers::Snapshot;
use crate::parsers::text::{joined_text, non_empty};
use crate::results::{ListingItem, Offer, PaginationState};
use crate::selector::Selector;

/// Maps document nodes to record fields.
///
/// Implementations only read from a snapshot; they never touch the live
/// session.
pub trait ExtractionAdapter: Send + Sync {
    /// Every listing tile in document order; unreadable tiles are `Err`
    fn listing_items(&self, snapshot: &Snapshot) -> Vec<Result<ListingItem, CrawlError>>;

    /// Whether a usable "load more" control is rendered
    fn pagination(&self, snapshot: &Snapshot) -> PaginationState;

    /// Offers in the option sub-view, in document order
    fn offers(&self, snapshot: &Snapshot) -> Vec<Offer>;
}

/// Extraction driven entirely by configured selectors
#[derive(Debug, Clone, Default)]
pub struct SelectorAdapter {
    selectors: SiteSelectors,
}

impl SelectorAdapter {
    pub fn new(selectors: SiteSelectors) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &SiteSelectors {
        &self.selectors
    }
}

impl ExtractionAdapter for SelectorAdapter {
    fn listing_items(&self, snapshot: &Snapshot) -> Vec<Result<ListingItem, CrawlError>> {
        let s = &self.selectors;
        let tiles = snapshot.select(&s.tile);
        ::log::debug!("Found {} listing tiles", tiles.len());

        tiles
            .into_iter()
            .enumerate()
            .map(|(idx, tile)| {
                let field = |selector: &Selector, separator: &str| {
                    snapshot
                        .find(tile, selector)
                        .and_then(|node| non_empty(&joined_text(node, separator)))
                };
                let item = ListingItem {
                    title: field(&s.title, " "),
                    category: field(&s.category, ""),
                    vehicle: field(&s.vehicle, ""),
                    price: field(&s.price, ""),
                };
                if item.is_blank() {
                    Err(CrawlError::ItemParse(format!(
                        "tile {} has none of title, category, vehicle or price",
                        idx + 1
                    )))
                } else {
                    Ok(item)
                }
            })
            .collect()
    }

    fn pagination(&self, snapshot: &Snapshot) -> PaginationState {
        let usable = snapshot
            .select(&self.selectors.load_more)
            .into_iter()
            .any(|button| button.value().attr("disabled").is_none());
        if usable {
            PaginationState::MoreAvailable
        } else {
            PaginationState::Exhausted
        }
    }

    fn offers(&self, snapshot: &Snapshot) -> Vec<Offer> {
        let s = &self.selectors;
        let Some(container) = snapshot.select(&s.offer_container).into_iter().next() else {
            return Vec::new();
        };

        snapshot
            .find_all(container, &s.offer)
            .into_iter()
            .filter_map(|offer| {
                let label = snapshot.find(offer, &s.offer_label).map(|n| joined_text(n, " "));
                let price = snapshot.find(offer, &s.offer_price).map(|n| joined_text(n, " "));
                match (label, price) {
                    (Some(label), Some(price)) => Some(Offer { label, price }),
                    _ => {
                        ::log::debug!("Skipping offer without label or price");
                        None
                    }
                }
            })
            .collect()
    }
}
