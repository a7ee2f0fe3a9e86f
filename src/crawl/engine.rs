// src/crawl/engine.rs
// =============================================================================
// The crawl loop.
//
// How it works:
// 1. Start with every start URL in the frontier
// 2. Pop the next unvisited page; skip it if it's outside the host scope
// 3. Fetch it; skip it if the fetch fails, the status is >= 400, or it
//    isn't HTML
// 4. Extract image candidates and resolve each one, writing a manifest row
// 5. Discover next-page (and optionally content) links and queue them
// 6. Sleep for the configured delay, repeat
//
// Stops when the frontier is empty or max_pages pages have been crawled.
//
// One worker, one page at a time. The frontier and the two "seen" sets
// belong to this loop alone and are passed down by reference.
// =============================================================================

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use scraper::Html;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::frontier::{Frontier, HostScope};
use crate::config::CrawlConfig;
use crate::download::{resolve_candidate, ManifestRow, Outcome, ResolveOptions};
use crate::extract::url::{host_of, redact_for_log, sanitize_name};
use crate::extract::{discover_links, extract_image_candidates, ImageCandidate};
use crate::fetch::{FetchError, Fetcher};
use crate::manifest::ManifestSink;

/// Counts printed at the end of a crawl.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_crawled: usize,
    pub downloaded: usize,
    pub would_download: usize,
    pub duplicates: usize,
    pub skipped_profile: usize,
    pub skipped_custom_keyword: usize,
    pub failed: usize,
}

impl CrawlSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Downloaded => self.downloaded += 1,
            Outcome::WouldDownload => self.would_download += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::SkippedProfile => self.skipped_profile += 1,
            Outcome::SkippedCustomKeyword => self.skipped_custom_keyword += 1,
            Outcome::FailedAllVariants => self.failed += 1,
        }
    }

    pub fn images_seen(&self) -> usize {
        self.downloaded
            + self.would_download
            + self.duplicates
            + self.skipped_profile
            + self.skipped_custom_keyword
            + self.failed
    }
}

// What happened when we asked for a page
enum PageFetch {
    Html(String),
    Rejected(String),
    Failed(FetchError),
}

// Everything we need from a parsed page. scraper::Html is dropped before
// any image is fetched.
struct ParsedPage {
    candidates: Vec<ImageCandidate>,
    links: Vec<String>,
}

// Runs a whole crawl
//
// Parameters:
//   config: validated settings
//   fetcher: used for both pages and images
//   manifest: receives one row per resolved candidate, in crawl order
//
// Returns: the summary, or an error if the manifest couldn't be written.
// Network and content problems never end the crawl.
pub async fn crawl<F, M>(config: &CrawlConfig, fetcher: &F, manifest: &mut M) -> Result<CrawlSummary>
where
    F: Fetcher + ?Sized,
    M: ManifestSink + ?Sized,
{
    let scope = HostScope::new(config.allowed_hosts(), config.allow_cross_domain);
    let mut frontier = Frontier::new(config.start_urls.iter().cloned());
    let mut seen_image_urls: HashSet<String> = HashSet::new();
    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut summary = CrawlSummary::default();

    let options = ResolveOptions {
        dry_run: config.dry_run,
        skip_url_keywords: config.skip_url_keywords.clone(),
        min_thumbnail_bytes: config.min_thumbnail_bytes,
    };

    while summary.pages_crawled < config.max_pages {
        let page_url = match frontier.pop_unvisited() {
            Some(url) => url,
            None => break,
        };

        if !scope.allows(&page_url) {
            debug!(url = %redact_for_log(&page_url), "outside allowed hosts, skipping");
            continue;
        }

        let html = match fetch_page(fetcher, &page_url).await {
            PageFetch::Html(html) => html,
            PageFetch::Rejected(reason) => {
                debug!(url = %redact_for_log(&page_url), reason = %reason, "page skipped");
                continue;
            }
            PageFetch::Failed(e) => {
                warn!(url = %redact_for_log(&page_url), error = %e, "failed to fetch page");
                continue;
            }
        };

        let base = match Url::parse(&page_url) {
            Ok(base) => base,
            Err(_) => continue,
        };

        summary.pages_crawled += 1;
        info!(
            page = summary.pages_crawled,
            url = %redact_for_log(&page_url),
            "crawling"
        );

        let page = parse_page(&html, &base, config.follow_content_links);
        let image_dir = image_dir_for(config, &page_url);

        for candidate in &page.candidates {
            // Claim the image before fetching it, so the same picture linked
            // from many pages is only resolved once
            if !seen_image_urls.insert(candidate.first_url().to_string()) {
                continue;
            }

            let resolution =
                resolve_candidate(fetcher, candidate, &image_dir, &mut seen_hashes, &options).await;
            debug!(
                url = %redact_for_log(candidate.first_url()),
                outcome = %resolution.outcome,
                "image resolved"
            );
            summary.record(resolution.outcome);

            manifest.append(&ManifestRow::new(
                &candidate.page_url,
                candidate.first_url(),
                candidate.variants.len(),
                resolution,
            ))?;
        }

        for link in page.links {
            if frontier.is_visited(&link) || !scope.allows(&link) {
                continue;
            }
            frontier.push(link);
        }

        if config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
        }
    }

    info!(
        pages = summary.pages_crawled,
        visited = frontier.visited_count(),
        images = summary.images_seen(),
        "crawl finished"
    );
    Ok(summary)
}

async fn fetch_page<F: Fetcher + ?Sized>(fetcher: &F, url: &str) -> PageFetch {
    let response = match fetcher.fetch_page(url).await {
        Ok(response) => response,
        Err(e) => return PageFetch::Failed(e),
    };

    if response.is_error_status() {
        return PageFetch::Rejected(format!("HTTP {}", response.status));
    }
    if !response.is_html() {
        return PageFetch::Rejected(format!("not HTML ({})", response.content_type));
    }

    PageFetch::Html(response.text())
}

fn parse_page(html: &str, base: &Url, follow_content_links: bool) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        candidates: extract_image_candidates(&document, base),
        links: discover_links(&document, base, follow_content_links)
            .all()
            .into_iter()
            .collect(),
    }
}

// <output>/<sanitized host>/images
fn image_dir_for(config: &CrawlConfig, page_url: &str) -> PathBuf {
    let host = host_of(page_url).unwrap_or_default();
    config.output_root.join(sanitize_name(&host)).join("images")
}
