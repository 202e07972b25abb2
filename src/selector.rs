use serde::{Deserialize, Serialize};

/// How a selector's value is compared against the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Attribute equals the value
    Exact,
    /// Attribute starts with the value
    Prefix,
    /// Attribute contains the value
    Contains,
    /// Node's own text contains the value (the attribute is ignored)
    Text,
}

/// A structural query over one node: optional tag name plus an attribute predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub kind: MatchKind,
    #[serde(default)]
    pub attribute: String,
    pub value: String,
}

impl Selector {
    pub fn exact(tag: &str, attribute: &str, value: &str) -> Self {
        Self::build(tag, MatchKind::Exact, attribute, value)
    }

    pub fn prefix(tag: &str, attribute: &str, value: &str) -> Self {
        Self::build(tag, MatchKind::Prefix, attribute, value)
    }

    pub fn contains(tag: &str, attribute: &str, value: &str) -> Self {
        Self::build(tag, MatchKind::Contains, attribute, value)
    }

    pub fn text(tag: &str, value: &str) -> Self {
        Self::build(tag, MatchKind::Text, "", value)
    }

    /// Shorthand for the `data-testid` attribute most listing pages key on
    pub fn test_id(tag: &str, value: &str) -> Self {
        Self::exact(tag, "data-testid", value)
    }

    fn build(tag: &str, kind: MatchKind, attribute: &str, value: &str) -> Self {
        Self {
            tag: if tag.is_empty() || tag == "*" {
                None
            } else {
                Some(tag.to_string())
            },
            kind,
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    fn tag_or_any(&self) -> &str {
        self.tag.as_deref().unwrap_or("*")
    }

    /// CSS form of the selector. Text predicates cannot be expressed in CSS,
    /// so only the tag part is rendered and callers filter on text themselves.
    pub fn to_css(&self) -> String {
        let value = self.value.replace('\\', "\\\\").replace('\'', "\\'");
        let tag = self.tag_or_any();
        match self.kind {
            MatchKind::Exact => format!("{}[{}='{}']", tag, self.attribute, value),
            MatchKind::Prefix => format!("{}[{}^='{}']", tag, self.attribute, value),
            MatchKind::Contains => format!("{}[{}*='{}']", tag, self.attribute, value),
            MatchKind::Text => tag.to_string(),
        }
    }

    /// XPath step (without axis) for the live session
    pub fn to_xpath_step(&self) -> String {
        let tag = self.tag_or_any();
        let value = xpath_literal(&self.value);
        match self.kind {
            MatchKind::Exact => format!("{}[@{}={}]", tag, self.attribute, value),
            MatchKind::Prefix => format!("{}[starts-with(@{}, {})]", tag, self.attribute, value),
            MatchKind::Contains => format!("{}[contains(@{}, {})]", tag, self.attribute, value),
            MatchKind::Text => format!("{}[contains(text(), {})]", tag, value),
        }
    }
}

/// Quotes a string for XPath 1.0, which has no escape sequences
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A selector plus an optional position, resolved from scratch on every use.
///
/// Locators never hold node references, so they stay valid across
/// `navigate_back()` and re-renders; only the position they name can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    /// 0-based position among all matches
    nth: Option<usize>,
}

impl Locator {
    pub fn new(selector: &Selector) -> Self {
        Self {
            selector: selector.clone(),
            nth: None,
        }
    }

    /// The `index`-th (0-based) match of `selector` in document order
    pub fn nth(selector: &Selector, index: usize) -> Self {
        Self {
            selector: selector.clone(),
            nth: Some(index),
        }
    }

    pub fn target(&self) -> &Selector {
        &self.selector
    }

    pub fn position(&self) -> Option<usize> {
        self.nth
    }

    pub fn to_xpath(&self) -> String {
        let path = format!("//{}", self.selector.to_xpath_step());
        match self.nth {
            // XPath positions are 1-based
            Some(n) => format!("({})[{}]", path, n + 1),
            None => path,
        }
    }
}

/// A predicate evaluated against the live document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Present(Locator),
    /// Present, displayed and enabled
    Clickable(Locator),
    AttributeEquals {
        locator: Locator,
        name: String,
        value: String,
    },
}

impl Condition {
    pub fn locator(&self) -> &Locator {
        match self {
            Condition::Present(l) | Condition::Clickable(l) => l,
            Condition::AttributeEquals { locator, .. } => locator,
        }
    }
}

/// What to do with a located node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Click,
    /// Navigate to the node's `href`
    Follow,
}
