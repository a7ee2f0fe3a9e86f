// src/extract/candidates.rs
// =============================================================================
// Turns a parsed page into a list of image candidates.
//
// A candidate is "one image on the page", carrying every URL we might
// download it from, best guess first. Two passes produce them:
//
// 1. Every <img>: srcset, src and the lazy-loading data-* attributes, plus
//    the wrapping <a href="big.jpg"> if there is one (that one goes first,
//    it's usually the original upload).
// 2. Every <a> pointing straight at an image file.
//
// Candidates that share the same first URL are collapsed, first one wins.
// =============================================================================

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::heuristics::{is_likely_profile_image, keyword_match, parent_element, PROFILE_MARKERS};
use super::url::{looks_like_image_url, normalize_url};
use super::variants::{guess_fullsize_variants, parse_srcset_best};

/// Attributes that may hold an image URL, in priority order.
pub const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-original", "data-full", "data-lazy-src"];

static IMAGES: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("valid selector"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// One image found on a page, not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub page_url: String,
    /// Never empty; `variants[0]` is the preferred URL.
    pub variants: Vec<String>,
    pub is_likely_profile: bool,
}

impl ImageCandidate {
    /// The URL this candidate is known by (used for cross-page dedup).
    pub fn first_url(&self) -> &str {
        &self.variants[0]
    }
}

// Extracts all image candidates from a page, in document order
pub fn extract_image_candidates(document: &Html, page_url: &Url) -> Vec<ImageCandidate> {
    let page = page_url.to_string();
    let mut out = Vec::new();

    for img in document.select(&IMAGES) {
        let mut urls: Vec<String> = Vec::new();

        if let Some(best) = img
            .value()
            .attr("srcset")
            .and_then(|srcset| parse_srcset_best(srcset, page_url))
        {
            urls.push(best);
        }

        for attr in IMAGE_ATTRS {
            if let Some(url) = img.value().attr(attr).and_then(|raw| normalize_url(raw, page_url)) {
                urls.push(url);
            }
        }

        if let Some(parent) = parent_element(&img) {
            if parent.value().name() == "a" {
                let linked = parent
                    .value()
                    .attr("href")
                    .and_then(|href| normalize_url(href, page_url))
                    .filter(|url| looks_like_image_url(url));
                if let Some(linked) = linked {
                    urls.insert(0, linked);
                }
            }
        }

        let variants = expand_variants(&urls);
        if variants.is_empty() {
            continue;
        }

        let is_likely_profile = is_likely_profile_image(&img, &variants[0]);
        out.push(ImageCandidate {
            page_url: page.clone(),
            variants,
            is_likely_profile,
        });
    }

    for anchor in document.select(&ANCHORS) {
        let url = match anchor
            .value()
            .attr("href")
            .and_then(|href| normalize_url(href, page_url))
        {
            Some(url) => url,
            None => continue,
        };
        if !looks_like_image_url(&url) || keyword_match(&url, PROFILE_MARKERS) {
            continue;
        }
        out.push(ImageCandidate {
            page_url: page.clone(),
            variants: guess_fullsize_variants(&url),
            is_likely_profile: false,
        });
    }

    let mut seen_first = HashSet::new();
    out.retain(|candidate| seen_first.insert(candidate.first_url().to_string()));
    out
}

// Expands each URL into its variants and concatenates them without repeats
fn expand_variants(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for url in urls {
        for variant in guess_fullsize_variants(url) {
            if seen.insert(variant.clone()) {
                out.push(variant);
            }
        }
    }
    out
}
