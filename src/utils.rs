use crate::errors::CrawlError;
use url::Url;

/// Checks that `raw` is an absolute http(s) URL under `allowed_prefix`
pub fn validate_start_url(raw: &str, allowed_prefix: Option<&str>) -> Result<Url, CrawlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CrawlError::InvalidInput("no URL provided".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| CrawlError::InvalidInput(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlError::InvalidInput(format!(
            "{}: unsupported scheme '{}'",
            raw,
            url.scheme()
        )));
    }

    if let Some(prefix) = allowed_prefix {
        if !raw.starts_with(prefix) {
            return Err(CrawlError::InvalidInput(format!(
                "{}: URL must start with {}",
                raw, prefix
            )));
        }
    }

    Ok(url)
}
