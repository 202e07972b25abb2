use crate::results::ItemIdentity;
use std::collections::HashSet;

/// Identities of every listing item seen during one crawl session.
///
/// Grows monotonically; nothing is ever removed.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: HashSet<ItemIdentity>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ItemIdentity) -> bool {
        self.seen.contains(id)
    }

    /// Records an identity, returning `true` if it was not seen before
    pub fn add(&mut self, id: ItemIdentity) -> bool {
        self.seen.insert(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
