//! Scripted in-memory document session for engine and driver tests.

use crate::config::SiteSelectors;
use crate::crawlers::session::DocumentSession;
use crate::errors::CrawlError;
use crate::results::ListingItem;
use crate::selector::{ActionKind, Condition, Locator, Selector};
use async_trait::async_trait;
use std::collections::VecDeque;

pub const LISTING_URL: &str = "https://www.carnival.com/cruise-search";

/// What the option's booking flow does
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Confirms cleanly and shows these (label, price) offers
    Offers(Vec<(&'static str, &'static str)>),
    /// Confirms, then renders the booking error container
    ErrorIndicator,
    /// The filter step at this index never renders
    FilterMissing(usize),
    /// Confirms cleanly but the offer list never renders
    NoOffers,
}

#[derive(Debug, Clone)]
pub struct FakeOption {
    pub href: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct FakeTile {
    pub item: ListingItem,
    pub dates: Vec<String>,
    pub options: Vec<FakeOption>,
    pub expandable: bool,
    /// Booking toggles already report `aria-checked="true"`
    pub toggles_checked: bool,
}

impl FakeTile {
    pub fn new(title: &str, price: &str) -> Self {
        Self {
            item: ListingItem::new(title, "Caribbean", "Horizon", price),
            dates: Vec::new(),
            options: Vec::new(),
            expandable: true,
            toggles_checked: false,
        }
    }

    pub fn option(mut self, date: &str, outcome: Outcome) -> Self {
        let n = self.options.len();
        self.dates.push(date.to_string());
        self.options.push(FakeOption {
            href: format!("/booking/{}/{}", slug(&self.item), n),
            outcome,
        });
        self
    }

    /// A date label with no matching booking link
    pub fn extra_date(mut self, date: &str) -> Self {
        self.dates.push(date.to_string());
        self
    }

    pub fn without_expand_control(mut self) -> Self {
        self.expandable = false;
        self
    }

    pub fn with_toggles_checked(mut self) -> Self {
        self.toggles_checked = true;
        self
    }
}

fn slug(item: &ListingItem) -> String {
    item.title
        .as_deref()
        .unwrap_or("trip")
        .to_lowercase()
        .replace(' ', "-")
}

#[derive(Debug, Clone, PartialEq)]
enum View {
    Listing,
    Booking {
        tile: usize,
        option: usize,
        filters_done: usize,
        confirmed: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Tile(usize),
    Expand(usize),
    Label(usize, usize),
    Action(usize, usize),
    LoadMore,
    Filter(usize),
    Confirm,
    ErrorIndicator,
    OfferContainer,
}

pub struct FakeSite {
    selectors: SiteSelectors,
    tiles: Vec<FakeTile>,
    pending_pages: VecDeque<Vec<FakeTile>>,
    view: View,
    history: Vec<View>,
    expanded: Option<usize>,
    stale_actions: u32,
    stale_attribute_reads: u32,
    disconnected: bool,
    actions: Vec<String>,
    closed: usize,
}

impl FakeSite {
    pub fn new(tiles: Vec<FakeTile>) -> Self {
        Self {
            selectors: SiteSelectors::default(),
            tiles,
            pending_pages: VecDeque::new(),
            view: View::Listing,
            history: Vec::new(),
            expanded: None,
            stale_actions: 0,
            stale_attribute_reads: 0,
            disconnected: false,
            actions: Vec::new(),
            closed: 0,
        }
    }

    /// `n` distinct tiles, each with one bookable option
    pub fn with_items(n: usize) -> Self {
        Self::new(
            (1..=n)
                .map(|i| {
                    FakeTile::new(&format!("Trip {}", i), &format!("${}99", i))
                        .option("Sat Mar 1", Outcome::Offers(vec![("Interior", "$529")]))
                })
                .collect(),
        )
    }

    /// Tiles revealed by the next "load more" click
    pub fn then_page(mut self, tiles: Vec<FakeTile>) -> Self {
        self.pending_pages.push_back(tiles);
        self
    }

    pub fn selectors(&self) -> &SiteSelectors {
        &self.selectors
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn on_listing(&self) -> bool {
        self.view == View::Listing
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn count_actions(&self, prefix: &str) -> usize {
        self.actions.iter().filter(|a| a.starts_with(prefix)).count()
    }

    pub fn closed_count(&self) -> usize {
        self.closed
    }

    /// The next `n` actions fail as if their node had gone stale
    pub fn stale_next_actions(&mut self, n: u32) {
        self.stale_actions = n;
    }

    /// The next `n` attribute checks fail as if their node had gone stale
    pub fn stale_next_attribute_reads(&mut self, n: u32) {
        self.stale_attribute_reads = n;
    }

    /// Every later action fails as if the browser had gone away
    pub fn disconnect_actions(&mut self) {
        self.disconnected = true;
    }

    fn toggles_checked(&self) -> bool {
        match &self.view {
            View::Booking { tile, .. } => self.tiles[*tile].toggles_checked,
            View::Listing => false,
        }
    }

    fn nodes(&self, selector: &Selector) -> Vec<Node> {
        let s = &self.selectors;
        match &self.view {
            View::Listing => {
                if selector == &s.tile {
                    (0..self.tiles.len()).map(Node::Tile).collect()
                } else if selector == &s.expand_control {
                    (0..self.tiles.len())
                        .filter(|t| self.tiles[*t].expandable)
                        .map(Node::Expand)
                        .collect()
                } else if selector == &s.option_label {
                    self.expanded
                        .map(|t| (0..self.tiles[t].dates.len()).map(|j| Node::Label(t, j)).collect())
                        .unwrap_or_default()
                } else if selector == &s.option_action {
                    self.expanded
                        .map(|t| (0..self.tiles[t].options.len()).map(|j| Node::Action(t, j)).collect())
                        .unwrap_or_default()
                } else if selector == &s.load_more && !self.pending_pages.is_empty() {
                    vec![Node::LoadMore]
                } else {
                    Vec::new()
                }
            }
            View::Booking {
                tile,
                option,
                filters_done,
                confirmed,
            } => {
                let outcome = &self.tiles[*tile].options[*option].outcome;
                if let Some(k) = s.filter_steps.iter().position(|f| &f.selector == selector) {
                    if *outcome == Outcome::FilterMissing(k) {
                        Vec::new()
                    } else {
                        vec![Node::Filter(k)]
                    }
                } else if selector == &s.confirm && *filters_done == s.filter_steps.len() {
                    vec![Node::Confirm]
                } else if selector == &s.error_indicator
                    && *confirmed
                    && *outcome == Outcome::ErrorIndicator
                {
                    vec![Node::ErrorIndicator]
                } else if selector == &s.offer_container
                    && *confirmed
                    && matches!(outcome, Outcome::Offers(_))
                {
                    vec![Node::OfferContainer]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn resolve(&self, locator: &Locator) -> Option<Node> {
        let nodes = self.nodes(locator.target());
        match locator.position() {
            Some(n) => nodes.get(n).copied(),
            None => nodes.first().copied(),
        }
    }

    fn require(&self, locator: &Locator) -> Result<Node, CrawlError> {
        self.resolve(locator)
            .ok_or_else(|| CrawlError::TransientElement(format!("no node for {}", locator.to_xpath())))
    }

    fn render_listing(&self) -> String {
        let mut html = String::from("<html><body>");
        for (t, tile) in self.tiles.iter().enumerate() {
            let item = &tile.item;
            html.push_str(r#"<div data-testid="tripTile">"#);
            if let Some(title) = &item.title {
                html.push_str(&format!(r#"<h2 data-testid="itinerary-title">{}</h2>"#, title));
            }
            if let Some(category) = &item.category {
                html.push_str(&format!(r#"<span data-testid="cg-region_{}">{}</span>"#, t, category));
            }
            if let Some(vehicle) = &item.vehicle {
                html.push_str(&format!(r#"<div data-testid="cg-ship_{}">{}</div>"#, t, vehicle));
            }
            if let Some(price) = &item.price {
                html.push_str(&format!(r#"<div data-testid="priceAmount">{}</div>"#, price));
            }
            html.push_str("</div>");
        }
        if !self.pending_pages.is_empty() {
            html.push_str(r#"<button data-testid="loadMoreResults">Load more</button>"#);
        }
        html.push_str("</body></html>");
        html
    }

    fn render_booking(&self, tile: usize, option: usize, confirmed: bool) -> String {
        let mut html = String::from("<html><body>");
        if confirmed {
            match &self.tiles[tile].options[option].outcome {
                Outcome::Offers(offers) => {
                    html.push_str(r#"<div data-testid="meta2022SliderContainer">"#);
                    for (label, price) in offers {
                        html.push_str(&format!(
                            r#"<div data-testid="metaButton2022"><button><div data-testid="metaLabel">{}</div><div data-testid="fromPriceLabel">{}</div></button></div>"#,
                            label, price
                        ));
                    }
                    html.push_str("</div>");
                }
                Outcome::ErrorIndicator => {
                    html.push_str(r#"<div data-testid="bookingErrorContainer">Not available</div>"#);
                }
                _ => {}
            }
        }
        html.push_str("</body></html>");
        html
    }
}

#[async_trait]
impl DocumentSession for FakeSite {
    async fn fetch(&mut self, url: &str) -> Result<(), CrawlError> {
        self.actions.push(format!("fetch {}", url));
        self.history.clear();
        self.view = View::Listing;
        self.expanded = None;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, CrawlError> {
        Ok(match &self.view {
            View::Listing => LISTING_URL.to_string(),
            View::Booking { tile, option, .. } => format!(
                "https://www.carnival.com{}",
                self.tiles[*tile].options[*option].href
            ),
        })
    }

    async fn navigate_back(&mut self) -> Result<(), CrawlError> {
        self.actions.push("back".to_string());
        if let Some(previous) = self.history.pop() {
            if previous == View::Listing {
                // The listing is rebuilt from scratch, collapsed
                self.expanded = None;
            }
            self.view = previous;
        }
        Ok(())
    }

    async fn probe(&mut self, condition: &Condition) -> Result<bool, CrawlError> {
        if matches!(condition, Condition::AttributeEquals { .. }) && self.stale_attribute_reads > 0 {
            self.stale_attribute_reads -= 1;
            return Err(CrawlError::TransientElement("stale element reference".to_string()));
        }
        let node = self.resolve(condition.locator());
        Ok(match condition {
            Condition::Present(_) | Condition::Clickable(_) => node.is_some(),
            Condition::AttributeEquals { name, value, .. } => match node {
                Some(Node::Expand(t)) if *name == self.selectors.expanded_attribute => {
                    (self.expanded == Some(t)) == (value == "true")
                }
                _ => false,
            },
        })
    }

    async fn act(&mut self, locator: &Locator, action: ActionKind) -> Result<(), CrawlError> {
        if self.disconnected {
            return Err(CrawlError::Session("invalid session id".to_string()));
        }
        if self.stale_actions > 0 {
            self.stale_actions -= 1;
            return Err(CrawlError::TransientElement("stale element reference".to_string()));
        }

        let node = self.require(locator)?;
        match (node, action) {
            (Node::Expand(t), ActionKind::Click) => {
                self.actions.push(format!("expand {}", t));
                self.expanded = if self.expanded == Some(t) { None } else { Some(t) };
            }
            (Node::LoadMore, ActionKind::Click) => {
                self.actions.push("load more".to_string());
                if let Some(page) = self.pending_pages.pop_front() {
                    self.tiles.extend(page);
                }
            }
            (Node::Action(t, j), ActionKind::Follow) => {
                self.actions.push(format!("follow {}/{}", t, j));
                let landing = View::Booking {
                    tile: t,
                    option: j,
                    filters_done: 0,
                    confirmed: false,
                };
                // The booking link redirects once before the flow renders
                self.history.push(View::Listing);
                self.history.push(landing.clone());
                self.view = landing;
            }
            (Node::Filter(k), ActionKind::Click) => {
                self.actions.push(format!("filter {}", k));
                if let View::Booking { filters_done, .. } = &mut self.view {
                    *filters_done = k + 1;
                }
            }
            (Node::Confirm, ActionKind::Click) => {
                self.actions.push("confirm".to_string());
                if let View::Booking { confirmed, .. } = &mut self.view {
                    *confirmed = true;
                }
            }
            (node, action) => {
                return Err(CrawlError::Session(format!("cannot {:?} {:?}", action, node)));
            }
        }
        Ok(())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, CrawlError> {
        Ok(match locator.position() {
            Some(_) => usize::from(self.resolve(locator).is_some()),
            None => self.nodes(locator.target()).len(),
        })
    }

    async fn read_text(&mut self, locator: &Locator) -> Result<String, CrawlError> {
        match self.require(locator)? {
            Node::Label(t, j) => Ok(format!("  {} \n", self.tiles[t].dates[j])),
            Node::Tile(t) => Ok(self.tiles[t].item.title.clone().unwrap_or_default()),
            _ => Ok(String::new()),
        }
    }

    async fn read_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, CrawlError> {
        Ok(match self.require(locator)? {
            Node::Expand(t) if name == self.selectors.expanded_attribute => {
                Some((self.expanded == Some(t)).to_string())
            }
            Node::Action(t, j) if name == "href" => Some(self.tiles[t].options[j].href.clone()),
            Node::Filter(_) if name == "aria-checked" => Some(self.toggles_checked().to_string()),
            _ => None,
        })
    }

    async fn source(&mut self) -> Result<String, CrawlError> {
        Ok(match &self.view {
            View::Listing => self.render_listing(),
            View::Booking {
                tile,
                option,
                confirmed,
                ..
            } => self.render_booking(*tile, *option, *confirmed),
        })
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        self.closed += 1;
        Ok(())
    }
}
