pub mod listing;
pub mod text;


use crate::selector::{MatchKind, Selector};
use scraper::{ElementRef, Html};

pub use listing::{ExtractionAdapter, SelectorAdapter};

/// A parsed, immutable copy of the document at one instant.
///
/// Nodes handed out by a snapshot borrow from it and die with it; a fresh
/// snapshot is taken whenever the live document may have changed.
pub struct Snapshot {
    html: Html,
}

impl Snapshot {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First descendant of `root` matching `selector`, in document order
    pub fn find<'a>(&self, root: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
        find_all(root, selector).into_iter().next()
    }

    /// All descendants of `root` matching `selector`, in document order
    pub fn find_all<'a>(&self, root: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
        find_all(root, selector)
    }

    /// Convenience for queries from the document root
    pub fn select(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        find_all(self.root(), selector)
    }
}

fn find_all<'a>(root: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    let css = selector.to_css();
    let compiled = match scraper::Selector::parse(&css) {
        Ok(compiled) => compiled,
        Err(e) => {
            ::log::warn!("Unusable selector {}: {:?}", css, e);
            return Vec::new();
        }
    };

    let nodes = root.select(&compiled);
    if selector.kind == MatchKind::Text {
        nodes
            .filter(|node| text::joined_text(*node, " ").contains(&selector.value))
            .collect()
    } else {
        nodes.collect()
    }
}
