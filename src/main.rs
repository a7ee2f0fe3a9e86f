// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, controlled by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Validate them into a CrawlConfig (the only fatal errors live here)
// 4. Run the crawl and print a summary
// 5. Exit with proper code (0 = crawl finished, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;       // src/cli.rs - command-line parsing
mod config;    // src/config.rs - validated settings
mod crawl;     // src/crawl/ - frontier + crawl loop
mod download;  // src/download/ - variant resolution, dedup, saving
mod extract;   // src/extract/ - URL rules, heuristics, candidate extraction
mod fetch;     // src/fetch/ - HTTP access behind a trait
mod manifest;  // src/manifest.rs - manifest.csv writer

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::CrawlConfig;
use crawl::CrawlSummary;
use fetch::HttpFetcher;
use manifest::CsvManifest;

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Configuration problems and manifest I/O failures end up here
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout only carries the summary (or JSON)
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = CrawlConfig::from_cli(&cli)?;

    println!("🔍 Crawling {} start page(s)", config.start_urls.len());
    if config.dry_run {
        println!("🧪 Dry run: nothing will be written except the manifest");
    }

    let fetcher = HttpFetcher::new(&config)?;
    let mut manifest = CsvManifest::create(&config.manifest_path())?;

    let summary = crawl::crawl(&config, &fetcher, &mut manifest).await?;

    if cli.json {
        print_json(&summary, manifest.path())?;
    } else {
        print_summary(&summary, manifest.path());
    }

    Ok(0)
}

fn print_json(summary: &CrawlSummary, manifest_path: &Path) -> Result<()> {
    let mut value = serde_json::to_value(summary)?;
    value["manifest_path"] = serde_json::Value::String(manifest_path.display().to_string());
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_summary(summary: &CrawlSummary, manifest_path: &Path) {
    println!();
    println!("📊 Summary:");
    println!("   📄 Pages crawled: {}", summary.pages_crawled);
    println!("   ✅ Images downloaded: {}", summary.downloaded);
    println!("   🧪 Images (dry-run only): {}", summary.would_download);
    println!("   👤 Skipped profile images: {}", summary.skipped_profile);
    println!("   🚫 Skipped by keyword: {}", summary.skipped_custom_keyword);
    println!("   ♻️  Duplicates skipped: {}", summary.duplicates);
    println!("   ❌ Failed/unsupported: {}", summary.failed);
    println!("   📋 Manifest: {}", manifest_path.display());
}
