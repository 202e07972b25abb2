use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "listing-scout")]
#[command(about = "Incremental listing crawler with per-item booking inspection")]
#[command(version)]
pub struct Args {
    /// Listing page to start from (prompted for when omitted)
    pub uri: Option<String>,

    /// JSON configuration file with selectors and timeouts
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Seconds to wait for a detail panel to expand
    #[arg(long)]
    pub expand_timeout: Option<u64>,

    /// Seconds to wait for an offer list to render
    #[arg(long)]
    pub offers_timeout: Option<u64>,

    /// Comma-separated answers used instead of prompting (e.g. "y,y,2-5")
    #[arg(short, long)]
    pub decide: Option<String>,

    /// Print the full report as JSON when done
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "listing-scout",
            "https://www.carnival.com/cruise-search",
            "--expand-timeout",
            "15",
            "--decide",
            "y,3",
            "--json",
        ]);
        assert_eq!(args.uri.as_deref(), Some("https://www.carnival.com/cruise-search"));
        assert_eq!(args.expand_timeout, Some(15));
        assert_eq!(args.decide.as_deref(), Some("y,3"));
        assert!(args.json);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_uri_is_optional() {
        let args = Args::parse_from(["listing-scout"]);
        assert!(args.uri.is_none());
        assert!(!args.json);
    }
}
