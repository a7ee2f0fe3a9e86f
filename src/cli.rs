// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// The values parsed here are raw user input. config.rs validates them and
// turns them into a CrawlConfig before any crawling starts.
// =============================================================================

use clap::Parser;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

#[derive(Parser, Debug)]
#[command(
    name = "image-harvester",
    version = "0.1.0",
    about = "Crawl blog/forum pages and download full-size images while skipping profile photos",
    long_about = "image-harvester follows pagination (and optionally post/thread links) from one or \
                  more start pages, downloads the largest version of every image it finds, skips \
                  avatars, deduplicates by SHA-256 and writes a manifest.csv describing every decision."
)]
pub struct Cli {
    /// One or more start URLs (blog/forum pages)
    ///
    /// Example: image-harvester https://example.com/blog https://example.com/gallery
    #[arg(required = true, num_args = 1..)]
    pub start_urls: Vec<String>,

    /// Output directory for images and manifest.csv
    #[arg(long, default_value = "image_archive")]
    pub output: String,

    /// Maximum number of HTML pages to crawl
    #[arg(long, default_value_t = 2000)]
    pub max_pages: usize,

    /// Delay between page requests, in milliseconds
    #[arg(long, default_value_t = 350)]
    pub delay_ms: u64,

    /// HTTP request timeout, in seconds
    #[arg(long, default_value_t = 25)]
    pub timeout_secs: u64,

    /// Allow crawling outside the start URL domains
    #[arg(long)]
    pub allow_cross_domain: bool,

    /// Only follow pagination links (do not follow post/thread/content links)
    #[arg(long)]
    pub no_follow_content_links: bool,

    /// Crawl and report what would download, but do not write image files
    #[arg(long)]
    pub dry_run: bool,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Extra URL keyword to skip (repeatable)
    #[arg(long = "skip-url-keyword")]
    pub skip_url_keywords: Vec<String>,

    /// Cookie for archives that require a login: a raw header, a JSON
    /// cookie export, or a path to a file holding either
    #[arg(long)]
    pub cookie: Option<String>,

    /// Images smaller than this many bytes whose URL looks like a thumbnail
    /// are rejected (0 disables the check)
    #[arg(long, default_value_t = 512)]
    pub min_thumbnail_bytes: usize,

    /// Print the final summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
