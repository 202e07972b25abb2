use scraper::ElementRef;

/// Text fragments under `node`, each trimmed, empty ones dropped
pub fn stripped_strings<'a>(node: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    node.text().map(str::trim).filter(|s| !s.is_empty())
}

/// Stripped text fragments joined with `separator`
pub fn joined_text(node: ElementRef<'_>, separator: &str) -> String {
    stripped_strings(node).collect::<Vec<_>>().join(separator)
}

/// Collapses runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text, or `None` when nothing readable is left
pub fn non_empty(text: &str) -> Option<String> {
    let text = normalize_whitespace(text);
    if text.is_empty() { None } else { Some(text) }
}
