// src/config.rs
// =============================================================================
// Validated crawl settings.
//
// The CLI gives us raw strings and numbers. CrawlConfig::from_cli() checks
// and cleans them once, up front:
// - start URLs are normalized; invalid ones are dropped with a warning
// - no valid start URL at all is the one fatal configuration error
// - numeric limits are clamped to sane ranges
// - skip keywords are trimmed, lowercased and de-duplicated
// - the cookie may be a raw header, a browser cookie export (JSON), or a
//   path to a file holding either; it always ends up as "a=1; b=2"
//
// After this point the crawler never has to re-check user input.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cli::{Cli, DEFAULT_USER_AGENT};
use crate::extract::url::{host_of, normalize_absolute};

pub const MAX_MAX_PAGES: usize = 5000;
pub const MAX_DELAY_MS: u64 = 10_000;
pub const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_urls: Vec<String>,
    pub output_root: PathBuf,
    pub max_pages: usize,
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub allow_cross_domain: bool,
    pub follow_content_links: bool,
    pub dry_run: bool,
    pub user_agent: String,
    pub skip_url_keywords: Vec<String>,
    pub cookie: Option<String>,
    pub min_thumbnail_bytes: usize,
}

impl CrawlConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let start_urls = normalize_start_urls(&cli.start_urls);
        if start_urls.is_empty() {
            bail!("No valid start URLs (only http/https pages can be crawled)");
        }

        let user_agent = match cli.user_agent.trim() {
            "" => DEFAULT_USER_AGENT.to_string(),
            ua => ua.to_string(),
        };

        Ok(Self {
            start_urls,
            output_root: PathBuf::from(&cli.output),
            max_pages: cli.max_pages.clamp(1, MAX_MAX_PAGES),
            delay_ms: cli.delay_ms.min(MAX_DELAY_MS),
            timeout_secs: cli.timeout_secs.clamp(1, MAX_TIMEOUT_SECS),
            allow_cross_domain: cli.allow_cross_domain,
            follow_content_links: !cli.no_follow_content_links,
            dry_run: cli.dry_run,
            user_agent,
            skip_url_keywords: normalize_keywords(&cli.skip_url_keywords),
            cookie: cli.cookie.as_deref().and_then(normalize_cookie),
            min_thumbnail_bytes: cli.min_thumbnail_bytes,
        })
    }

    /// Hosts of the start URLs; the crawl stays inside these unless
    /// cross-domain mode is on.
    pub fn allowed_hosts(&self) -> HashSet<String> {
        self.start_urls.iter().filter_map(|u| host_of(u)).collect()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_root.join("manifest.csv")
    }

    #[cfg(test)]
    pub fn for_tests(start_urls: Vec<String>) -> Self {
        Self {
            start_urls,
            output_root: PathBuf::from("image_archive"),
            max_pages: 100,
            delay_ms: 0,
            timeout_secs: 5,
            allow_cross_domain: false,
            follow_content_links: true,
            dry_run: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            skip_url_keywords: Vec::new(),
            cookie: None,
            min_thumbnail_bytes: 512,
        }
    }
}

fn normalize_start_urls(inputs: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in inputs {
        match normalize_absolute(raw) {
            Some(url) => {
                if seen.insert(url.clone()) {
                    out.push(url);
                }
            }
            None => warn!(url = %raw, "ignoring invalid start URL"),
        }
    }
    out
}

fn normalize_keywords(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

// Turns whatever the user passed to --cookie into a Cookie header value
//
// Tried in order:
// 1. JSON cookie export given inline
// 2. path to a file holding a JSON export or a raw header
// 3. the raw string itself
fn normalize_cookie(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(header) = cookie_json_to_header(raw) {
        return Some(header);
    }

    let path = Path::new(raw);
    if path.is_file() {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                debug!(path = %path.display(), "reading cookie from file");
                if let Some(header) = cookie_json_to_header(&contents) {
                    return Some(header);
                }
                let trimmed = contents.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not read cookie file"),
        }
    }

    Some(raw.to_string())
}

// Accepts the shapes browser extensions export:
//   [{"name": "a", "value": "1"}, ...]
//   {"cookies": [...]}
//   {"a": "1", "b": "2"}
//   ["a=1", "b=2"]
// Later duplicates win but keep the position of the first one.
fn cookie_json_to_header(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let mut pairs: Vec<(String, String)> = Vec::new();
    collect_cookie_pairs(&value, &mut pairs);
    if pairs.is_empty() {
        return None;
    }

    let mut merged: Vec<(String, String)> = Vec::new();
    for (name, value) in pairs {
        match merged.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => merged.push((name, value)),
        }
    }

    Some(
        merged
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn collect_cookie_pairs(value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_cookie_pairs(item, pairs);
            }
        }
        Value::Object(map) => {
            if let (Some(name), Some(value)) = (map.get("name"), map.get("value")) {
                if let (Some(name), Some(value)) = (name.as_str(), value.as_str()) {
                    push_cookie_pair(pairs, name, value);
                }
                return;
            }
            if let Some(cookies) = map.get("cookies") {
                collect_cookie_pairs(cookies, pairs);
                return;
            }
            for (name, value) in map {
                if let Some(value) = value.as_str() {
                    push_cookie_pair(pairs, name, value);
                }
            }
        }
        Value::String(pair) => {
            if let Some((name, value)) = pair.trim().split_once('=') {
                push_cookie_pair(pairs, name, value);
            }
        }
        _ => {}
    }
}

// Names with ';' or '=' would corrupt the header, so they are dropped
fn push_cookie_pair(pairs: &mut Vec<(String, String)>, name: &str, value: &str) {
    let name = name.trim();
    if name.is_empty() || name.contains(';') || name.contains('=') {
        return;
    }
    pairs.push((name.to_string(), value.trim().to_string()));
}
