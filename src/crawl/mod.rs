// src/crawl/mod.rs
// =============================================================================
// This module handles crawling.
//
// Features:
// - Breadth-first crawling from one or more start URLs
// - Stays on the start URLs' hosts unless cross-domain mode is on
// - Page cap (max_pages) and a polite delay between pages
// - Hands every image candidate to the downloader and records the result
//
// Rust concepts:
// - Generics: crawl() works with any Fetcher and any ManifestSink
// - Collections: HashSet for visited pages, VecDeque for the queue
// =============================================================================

mod engine;
mod frontier;

// Re-export the main crawling function
pub use engine::{crawl, CrawlSummary};
