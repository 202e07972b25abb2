use serde::{Deserialize, Serialize};
use std::fmt;

/// One rendered tile of the listing view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingItem {
    pub title: Option<String>,
    pub category: Option<String>,
    pub vehicle: Option<String>,
    pub price: Option<String>,
}

/// Identity of a listing item: its displayed fields, in order.
///
/// Two distinct items that render identical text share an identity, so the
/// later one is treated as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemIdentity(
    pub Option<String>,
    pub Option<String>,
    pub Option<String>,
    pub Option<String>,
);

impl ListingItem {
    pub fn new(title: &str, category: &str, vehicle: &str, price: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            vehicle: Some(vehicle.to_string()),
            price: Some(price.to_string()),
        }
    }

    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity(
            self.title.clone(),
            self.category.clone(),
            self.vehicle.clone(),
            self.price.clone(),
        )
    }

    pub fn is_blank(&self) -> bool {
        self.title.is_none() && self.category.is_none() && self.vehicle.is_none() && self.price.is_none()
    }
}

/// A listing item with its run-wide number (1-based, never reused)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedItem {
    pub number: usize,
    #[serde(flatten)]
    pub item: ListingItem,
}

impl fmt::Display for NumberedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Item {}:", self.number)?;
        let fields = [
            ("Title", &self.item.title),
            ("Category", &self.item.category),
            ("Vehicle", &self.item.vehicle),
            ("Price", &self.item.price),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                writeln!(f, "  {}: {}", name, value)?;
            }
        }
        write!(f, "{}", "-".repeat(40))
    }
}

/// New items of one round, in document order
pub type ListingBatch = Vec<NumberedItem>;

/// Whether the page can reveal more items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationState {
    MoreAvailable,
    Exhausted,
}

/// A priced offer inside one nested option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub label: String,
    pub price: String,
}

/// Outcome of the inspect sub-workflow for one nested option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionResult {
    pub date_label: String,
    pub available: bool,
    pub offers: Vec<Offer>,
    /// URL of the option's sub-view when its offers were read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// Reason the option degraded, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptionResult {
    pub fn unavailable(date_label: String, error: Option<String>) -> Self {
        Self {
            date_label,
            available: false,
            offers: Vec::new(),
            page_url: None,
            error,
        }
    }
}

/// Progress of the navigation engine through one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSession {
    /// 0-based position of the item in the listing
    pub item_index: usize,
    pub option_count: usize,
    pub current_option: usize,
    pub expanded: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum InspectionStatus {
    Completed,
    OutOfRange,
    Skipped(String),
}

/// Result of inspecting one requested item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionReport {
    /// 1-based position as requested
    pub item_number: usize,
    pub item: Option<ListingItem>,
    #[serde(flatten)]
    pub status: InspectionStatus,
    pub options: Vec<OptionResult>,
}

impl InspectionReport {
    pub fn out_of_range(item_number: usize) -> Self {
        Self {
            item_number,
            item: None,
            status: InspectionStatus::OutOfRange,
            options: Vec::new(),
        }
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            InspectionStatus::OutOfRange => {
                return write!(f, "Item number {} is out of range.", self.item_number);
            }
            InspectionStatus::Skipped(reason) => {
                return write!(f, "Item {} skipped: {}", self.item_number, reason);
            }
            InspectionStatus::Completed => {}
        }

        writeln!(f, "[Item {}]", self.item_number)?;
        if let Some(title) = self.item.as_ref().and_then(|i| i.title.as_ref()) {
            writeln!(f, "  Title: {}", title)?;
        }
        if self.options.is_empty() {
            return write!(f, "  No options found");
        }
        for (idx, option) in self.options.iter().enumerate() {
            writeln!(
                f,
                "  Option {}/{} ({}): available? {}",
                idx + 1,
                self.options.len(),
                option.date_label,
                option.available
            )?;
            if let Some(error) = &option.error {
                writeln!(f, "    Error: {}", error)?;
            }
            for offer in &option.offers {
                writeln!(f, "      {}: {}", offer.label, offer.price)?;
            }
            if let Some(url) = &option.page_url {
                writeln!(f, "    Page URL: {}", url)?;
            }
        }
        Ok(())
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub items: Vec<NumberedItem>,
    pub inspections: Vec<InspectionReport>,
}
