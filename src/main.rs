//! CLI entry point for the harvester tool.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{
    BatchConfig, BatchRequest, HtmlPage, HttpSink, ScanConfig, UniqueNames, generate_filename,
    metadata, run_batch, scan, scanner,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, CliCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Harvester starting");

    match args.command {
        CliCommand::Scan { input, base_url } => run_scan(&input, base_url.as_deref()).await,
        CliCommand::Download {
            input,
            base_url,
            max_concurrent,
            delay_ms,
            academic,
            output_dir,
        } => {
            let config = BatchConfig {
                max_concurrent: usize::from(max_concurrent),
                inter_batch_delay: Duration::from_millis(delay_ms),
            };
            run_download(&input, base_url.as_deref(), &config, academic, output_dir).await
        }
    }
}

/// Loads a page from a URL or a local file path.
async fn load_page(input: &str, base_url: Option<&str>) -> Result<HtmlPage> {
    if input.starts_with("http://") || input.starts_with("https://") {
        info!(url = input, "fetching page");
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        let html = client
            .get(input)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("failed to fetch {input}"))?
            .text()
            .await
            .context("failed to read response body")?;
        Ok(HtmlPage::parse(&html, input))
    } else {
        info!(path = input, "reading local file");
        let html = tokio::fs::read_to_string(Path::new(input))
            .await
            .with_context(|| format!("failed to read {input}"))?;
        Ok(HtmlPage::parse(&html, base_url.unwrap_or_default()))
    }
}

async fn run_scan(input: &str, base_url: Option<&str>) -> Result<()> {
    let page = load_page(input, base_url).await?;
    let config = ScanConfig::default();
    let result = scan(&page, &config);

    for link in &result.links {
        println!(
            "{:<12} {:<10} {}  {}",
            link.mime_class.as_str(),
            link.size_hint,
            if link.is_academic { "[academic]" } else { "" },
            link.url,
        );
    }
    for embedded in &result.embedded {
        println!("{:<12} {:<10} {}", embedded.kind, "", embedded.url);
    }

    if scanner::detect_academic_page(&page, &config) {
        let meta = metadata::extract(&page);
        info!(
            title = %meta.title,
            authors = meta.authors.len(),
            year = %meta.year,
            "academic page detected"
        );
    }

    info!(
        total = result.stats.total_links,
        downloadable = result.stats.downloadable,
        academic = result.stats.academic,
        media = result.stats.media,
        embedded = result.stats.embedded,
        "Scan complete"
    );
    Ok(())
}

async fn run_download(
    input: &str,
    base_url: Option<&str>,
    config: &BatchConfig,
    academic: bool,
    output_dir: std::path::PathBuf,
) -> Result<()> {
    let page = load_page(input, base_url).await?;
    let scan_config = ScanConfig::default();
    let result = scan(&page, &scan_config);

    let requests: Vec<BatchRequest> = if academic {
        if !scanner::detect_academic_page(&page, &scan_config) {
            warn!("page does not look academic, nothing to download");
            return Ok(());
        }
        let meta = metadata::extract(&page);
        let mut names = UniqueNames::new();
        result
            .academic_links
            .iter()
            .map(|link| BatchRequest {
                url: link.url.clone(),
                filename: generate_filename(&link.url, &meta).map(|name| names.claim(name)),
            })
            .collect()
    } else {
        result.links.iter().map(BatchRequest::from).collect()
    };

    if requests.is_empty() {
        info!("no downloadable resources found");
        return Ok(());
    }

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let sink = Arc::new(HttpSink::new(&output_dir));

    let outcome = run_batch(&requests, config, sink.as_ref()).await?;

    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        total = outcome.total(),
        "Download complete"
    );
    Ok(())
}
