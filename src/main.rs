use clap::Parser;
use listing_scout::{Crawl, CrawlError, CrawlReport, DecisionSource, ScriptedDecisions, StdinDecisions};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut stdin = StdinDecisions::new();
    let uri = match &args.uri {
        Some(uri) => uri.trim().to_string(),
        None => stdin
            .ask("Enter the listing URL: ")
            .await
            .unwrap_or_default()
            .trim()
            .to_string(),
    };
    if uri.is_empty() {
        println!("No URL provided. Exiting.");
        return ExitCode::SUCCESS;
    }

    ::log::info!("Starting crawler for URI: {}", uri);

    let mut crawl = Crawl::new(&uri);
    if let Some(path) = &args.config {
        crawl = match crawl.with_config_file(path) {
            Ok(crawl) => crawl,
            Err(e) => {
                ::log::error!("Failed to load configuration: {}", e);
                return ExitCode::FAILURE;
            }
        };
    }
    if let Some(url) = &args.webdriver_url {
        crawl = crawl.with_webdriver_url(url);
    }
    if let Some(secs) = args.expand_timeout {
        crawl = crawl.with_expand_timeout(secs);
    }
    if let Some(secs) = args.offers_timeout {
        crawl = crawl.with_offers_timeout(secs);
    }

    println!("Note: Crawling requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        crawl.config().webdriver_url
    );

    let mut decisions: Box<dyn DecisionSource> = match &args.decide {
        Some(script) => Box::new(ScriptedDecisions::from_script(script).echoing()),
        None => Box::new(stdin),
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            ::log::warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let start_time = std::time::Instant::now();
    match crawl.run(decisions.as_mut(), shutdown).await {
        Ok(report) => {
            print_report(&report, args.json);
            ::log::info!(
                "Finished in {:.2} seconds",
                start_time.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(CrawlError::UserAbort) => {
            println!("\nInterrupted by user. Exiting...");
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Crawl failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &CrawlReport, json: bool) {
    for inspection in &report.inspections {
        println!("{}", inspection);
    }

    if json {
        match serde_json::to_string_pretty(report) {
            Ok(out) => println!("{}", out),
            Err(e) => ::log::error!("Failed to serialize report: {}", e),
        }
    }
}
