// src/extract/heuristics.rs
// =============================================================================
// Keyword rules that classify elements on a page.
//
// Three questions get answered here:
// 1. Is this <img> a profile photo / avatar? (we never download those)
// 2. Is this <a> a "next page" link? (pagination)
// 3. Is this <a> a link to a post/thread/article? (content)
//
// All rules are plain functions over an element and its URL, so they can be
// tested without any network access. The marker lists are static tables.
//
// Rust concepts:
// - BTreeSet: a sorted set, so discovered links come out in a stable order
// - ElementRef: a borrowed handle to an element inside a scraper::Html tree
// =============================================================================

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::url::{looks_like_image_url, normalize_url};

pub const PROFILE_MARKERS: &[&str] = &[
    "avatar",
    "profile",
    "userpic",
    "gravatar",
    "author-photo",
    "member-photo",
    "display-picture",
];

/// Tokens that suggest a URL points at a small rendition.
pub const THUMB_HINTS: &[&str] = &[
    "thumb", "thumbnail", "_tn", "-tn", "_sm", "-sm", "_small", "-small", "small/", "/small",
];

pub const NEXT_MARKERS: &[&str] = &[
    "next", "older", "more", "weiter", "suivant", "volgende", "nast", "\u{203A}", "\u{00BB}", ">>",
    ">",
];

const PAGINATION_ATTR_MARKERS: &[&str] = &["pagination", "pager", "older", "newer"];

const CONTENT_PATH_MARKERS: &[&str] = &[
    "/post", "/posts/", "/blog/", "/article", "/topic", "/thread", "/forum/",
];

// Attachment and gallery pages usually wrap the full-size file
const GALLERY_PATH_MARKERS: &[&str] = &[
    "/photo/",
    "/photos/",
    "/gallery/",
    "/attachment/",
    "/attachments/",
    "/media/",
    "attachment_id=",
    "image_id=",
    "photo_id=",
];

const CONTENT_ATTR_MARKERS: &[&str] = &[
    "post", "entry", "topic", "thread", "article", "photo", "gallery", "attachment",
];

static PAGE_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&](page|p)=\d+").expect("valid page regex"));

static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid digit regex"));

static PAGINATION_CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(pagination|pager|pagenav|nav-links)").expect("valid container regex")
});

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static LINK_TAGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[href]").expect("valid selector"));
static CLASSED: Lazy<Selector> = Lazy::new(|| Selector::parse("[class]").expect("valid selector"));

/// Case-insensitive "contains any of these" check.
pub fn keyword_match<S: AsRef<str>>(value: &str, keywords: &[S]) -> bool {
    let lowered = value.to_lowercase();
    keywords
        .iter()
        .any(|keyword| lowered.contains(keyword.as_ref()))
}

// Attribute values joined with spaces (missing attributes are skipped)
fn attr_text(element: &ElementRef<'_>, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text with each text node trimmed and joined by single spaces.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

// Decides whether an image is someone's avatar
//
// Looks at:
// - the image URL
// - class/id/alt/title of the <img>
// - class/id of the direct parent (e.g. <div class="author-photo"><img></div>)
pub fn is_likely_profile_image(element: &ElementRef<'_>, url: &str) -> bool {
    if keyword_match(url, PROFILE_MARKERS) {
        return true;
    }

    let mut scanned = attr_text(element, &["class", "id", "alt", "title"]);
    if let Some(parent) = parent_element(element) {
        scanned.push(' ');
        scanned.push_str(&attr_text(&parent, &["class", "id"]));
    }

    keyword_match(&scanned, PROFILE_MARKERS)
}

// Decides whether an anchor points to the next page of a listing
pub fn is_next_link(element: &ElementRef<'_>, href: &str) -> bool {
    let rel = element.value().attr("rel").unwrap_or("");
    if keyword_match(rel, &["next"]) {
        return true;
    }

    let text = element_text(element);
    let attrs = attr_text(element, &["aria-label", "title", "class", "id"]);
    if keyword_match(&text, NEXT_MARKERS) || keyword_match(&attrs, NEXT_MARKERS) {
        return true;
    }

    let class_id = attr_text(element, &["class", "id"]);
    if keyword_match(&class_id, PAGINATION_ATTR_MARKERS) {
        return true;
    }

    PAGE_QUERY.is_match(&href.to_lowercase())
}

// Decides whether an anchor looks like a link to a post, thread, article
// or attachment page
//
// Gallery markers only count for pages, not for the image files themselves
// (the candidate extractor already picks those up).
pub fn is_probable_content_link(element: &ElementRef<'_>, href: &str) -> bool {
    let href_lower = href.to_lowercase();
    if CONTENT_PATH_MARKERS.iter().any(|m| href_lower.contains(m)) {
        return true;
    }
    if !looks_like_image_url(href)
        && GALLERY_PATH_MARKERS
            .iter()
            .any(|m| href_lower.contains(m))
    {
        return true;
    }

    let attrs = attr_text(element, &["class", "id", "rel"]);
    if keyword_match(&attrs, CONTENT_ATTR_MARKERS) {
        return true;
    }

    // Dated permalinks: descriptive text plus a year somewhere in the URL
    element_text(element).chars().count() > 15 && FOUR_DIGITS.is_match(&href_lower)
}

/// Links found on one page, split by why we want to follow them.
#[derive(Debug, Default)]
pub struct DiscoveredLinks {
    pub next: BTreeSet<String>,
    pub content: BTreeSet<String>,
}

impl DiscoveredLinks {
    /// Both sets merged, in sorted order.
    pub fn all(&self) -> BTreeSet<String> {
        self.next.union(&self.content).cloned().collect()
    }
}

// Finds every link worth following from this page
//
// Sources of next-page links:
// - <link rel="next" href="..."> in the head
// - anchors that pass is_next_link()
// - every anchor inside a pagination container (class="pagination", ...)
//
// Content links are only collected when follow_content is true.
pub fn discover_links(document: &Html, page_url: &Url, follow_content: bool) -> DiscoveredLinks {
    let mut found = DiscoveredLinks::default();

    for link in document.select(&LINK_TAGS) {
        let rel = link.value().attr("rel").unwrap_or("");
        if !keyword_match(rel, &["next"]) {
            continue;
        }
        if let Some(href) = link.value().attr("href").and_then(|h| normalize_url(h, page_url)) {
            found.next.insert(href);
        }
    }

    for anchor in document.select(&ANCHORS) {
        let href = match anchor
            .value()
            .attr("href")
            .and_then(|h| normalize_url(h, page_url))
        {
            Some(href) => href,
            None => continue,
        };

        if is_next_link(&anchor, &href) {
            found.next.insert(href.clone());
        }
        if follow_content && is_probable_content_link(&anchor, &href) {
            found.content.insert(href);
        }
    }

    for container in document.select(&CLASSED) {
        let class = container.value().attr("class").unwrap_or("");
        if !PAGINATION_CONTAINER.is_match(class) {
            continue;
        }
        for anchor in container.select(&ANCHORS) {
            if let Some(href) = anchor
                .value()
                .attr("href")
                .and_then(|h| normalize_url(h, page_url))
            {
                found.next.insert(href);
            }
        }
    }

    found
}
