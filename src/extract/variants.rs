// src/extract/variants.rs
// =============================================================================
// Full-size variant guessing.
//
// Blogs and forums rarely link the original image directly. Instead they
// show thumbnails like:
//   /uploads/thumbs/cat.jpg
//   /uploads/cat-thumb.jpg
//   /uploads/cat-800x600.jpg
//   /uploads/cat.jpg?w=300&h=200
//
// guess_fullsize_variants() turns one image URL into an ordered list of
// guesses. The first entry is always the URL itself, later entries are
// rewrites that undo one thumbnailing convention each. The downloader tries
// them in order and stops at the first one that works.
//
// Rust concepts:
// - Static tables: the rewrite rules are data, not if/else chains
// - Lazy: regexes are compiled once on first use
// =============================================================================

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::url::normalize_url;

/// Query keys that resize or crop an image on the fly.
pub const THUMB_QUERY_KEYS: &[&str] = &[
    "w",
    "h",
    "width",
    "height",
    "size",
    "thumb",
    "thumbnail",
    "fit",
    "crop",
    "quality",
    "resize",
    "maxwidth",
    "maxheight",
    "sz",
    "s",
];

// One way of turning a thumbnail path back into a full-size path
enum PathRule {
    /// Drop a whole path segment, e.g. "/thumbs/"
    Segment(&'static str),
    /// Regex replacement on the path
    Pattern(&'static Lazy<Regex>, &'static str),
}

static SUFFIX_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[_-](thumb|thumbnail|small|sm|tn)\b").expect("valid suffix regex")
});

static PREFIX_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(thumb|thumbnail|small)[_-]").expect("valid prefix regex")
});

static RESIZE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[-_]\d{2,4}x\d{2,4}(\.[a-z0-9]{3,5})$").expect("valid resize regex")
});

// Order matters: it is the order variants are tried in
static PATH_RULES: &[PathRule] = &[
    PathRule::Segment("/thumb/"),
    PathRule::Segment("/thumbs/"),
    PathRule::Segment("/thumbnail/"),
    PathRule::Segment("/thumbnails/"),
    PathRule::Segment("/cache/"),
    PathRule::Segment("/resized/"),
    PathRule::Pattern(&SUFFIX_TOKEN, ""),
    PathRule::Pattern(&PREFIX_TOKEN, ""),
    PathRule::Pattern(&RESIZE_SUFFIX, "$1"),
];

impl PathRule {
    fn apply(&self, path: &str) -> String {
        match self {
            PathRule::Segment(segment) => path.replace(segment, "/"),
            PathRule::Pattern(re, replacement) => re.replace_all(path, *replacement).into_owned(),
        }
    }
}

// Produces the ordered, de-duplicated list of full-size guesses
//
// Example:
//   "https://x.org/img/thumbs/cat-thumb.jpg?w=200"
//   -> [
//        "https://x.org/img/thumbs/cat-thumb.jpg?w=200",   (original)
//        "https://x.org/img/thumbs/cat-thumb.jpg",         (query stripped)
//        "https://x.org/img/cat-thumb.jpg?w=200",          (segment dropped)
//        "https://x.org/img/thumbs/cat.jpg?w=200",         (suffix stripped)
//      ]
pub fn guess_fullsize_variants(url: &str) -> Vec<String> {
    let mut variants = vec![url.to_string()];

    let stripped = strip_thumbnail_query_params(url);
    if stripped != url {
        variants.push(stripped);
    }

    if let Ok(parsed) = Url::parse(url) {
        let path = parsed.path().to_string();
        for rule in PATH_RULES {
            let rewritten = rule.apply(&path);
            if rewritten.is_empty() || rewritten == path {
                continue;
            }
            let mut updated = parsed.clone();
            updated.set_path(&rewritten);
            variants.push(updated.to_string());
        }
    }

    dedupe_preserving_order(variants)
}

// Removes resize/crop query parameters, leaving everything else untouched
//
// Pairs we keep are copied byte-for-byte so their encoding never changes.
// If nothing was removed the input comes back unchanged.
pub fn strip_thumbnail_query_params(url: &str) -> String {
    let mut parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };
    let query = match parsed.query() {
        Some(query) if !query.is_empty() => query.to_string(),
        _ => return url.to_string(),
    };

    let mut removed = false;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            let is_thumb_key = THUMB_QUERY_KEYS
                .iter()
                .any(|thumb| thumb.eq_ignore_ascii_case(key));
            removed |= is_thumb_key;
            !is_thumb_key
        })
        .collect();

    if !removed {
        return url.to_string();
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.set_query(Some(&kept.join("&")));
    }
    parsed.to_string()
}

// Picks the biggest entry of a srcset attribute
//
// Scoring:
//   "a.jpg 400w" -> 400
//   "a.jpg 2x"   -> 2000
//   "a.jpg"      -> 1
// Ties keep the first entry seen.
pub fn parse_srcset_best(srcset: &str, base: &Url) -> Option<String> {
    let mut best: Option<String> = None;
    let mut best_score: i64 = -1;

    for chunk in srcset.split(',') {
        let mut bits = chunk.split_whitespace();
        let raw = match bits.next() {
            Some(raw) => raw,
            None => continue,
        };
        let candidate = match normalize_url(raw, base) {
            Some(candidate) => candidate,
            None => continue,
        };

        let score = bits.next().map(descriptor_score).unwrap_or(1);
        if score > best_score {
            best_score = score;
            best = Some(candidate);
        }
    }

    best
}

fn descriptor_score(descriptor: &str) -> i64 {
    let token = descriptor.trim().to_ascii_lowercase();
    if let Some(width) = token.strip_suffix('w') {
        width.parse::<i64>().unwrap_or(1)
    } else if let Some(density) = token.strip_suffix('x') {
        density
            .parse::<f64>()
            .map(|d| (d * 1000.0) as i64)
            .unwrap_or(1)
    } else {
        1
    }
}

/// Drops repeated entries, keeping the first occurrence.
pub fn dedupe_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why return a Vec instead of a single "best" URL?
//    - We can't know which guess exists until we ask the server
//    - The downloader tries them in order, so order = confidence
//
// 2. What does Cow mean in replace_all()?
//    - regex returns Cow<str>: borrowed if nothing matched, owned otherwise
//    - into_owned() gives us a String either way
//
// 3. Why HashSet::insert inside filter()?
//    - insert() returns false for values already present
//    - so filter(|v| seen.insert(v.clone())) keeps only first occurrences
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_url_has_single_variant() {
        let variants = guess_fullsize_variants("https://x.org/img/cat.jpg");
        assert_eq!(variants, vec!["https://x.org/img/cat.jpg"]);
    }

    #[test]
    fn test_suffix_token_is_stripped() {
        let variants = guess_fullsize_variants("https://x.org/img/cat-thumb.jpg");
        assert_eq!(
            variants,
            vec!["https://x.org/img/cat-thumb.jpg", "https://x.org/img/cat.jpg"]
        );
    }

    #[test]
    fn test_variants_follow_rule_order() {
        let variants = guess_fullsize_variants("https://x.org/img/thumbs/cat-thumb.jpg?w=200");
        assert_eq!(
            variants,
            vec![
                "https://x.org/img/thumbs/cat-thumb.jpg?w=200",
                "https://x.org/img/thumbs/cat-thumb.jpg",
                "https://x.org/img/cat-thumb.jpg?w=200",
                "https://x.org/img/thumbs/cat.jpg?w=200",
            ]
        );
    }

    #[test]
    fn test_prefix_and_resize_rules() {
        let variants = guess_fullsize_variants("https://x.org/small_dog.png");
        assert_eq!(variants[1], "https://x.org/dog.png");

        let variants = guess_fullsize_variants("https://x.org/uploads/photo-800x600.jpg");
        assert_eq!(
            variants,
            vec![
                "https://x.org/uploads/photo-800x600.jpg",
                "https://x.org/uploads/photo.jpg"
            ]
        );
    }

    #[test]
    fn test_cache_and_resized_segments_are_dropped() {
        let variants = guess_fullsize_variants("https://x.org/media/cache/resized/cat.jpg");
        assert_eq!(
            variants,
            vec![
                "https://x.org/media/cache/resized/cat.jpg",
                "https://x.org/media/resized/cat.jpg",
                "https://x.org/media/cache/cat.jpg",
            ]
        );
    }

    #[test]
    fn test_short_size_keys_are_stripped() {
        assert_eq!(
            strip_thumbnail_query_params("https://x.org/a.jpg?sz=200&id=4&s=64"),
            "https://x.org/a.jpg?id=4"
        );
        // only whole keys count
        assert_eq!(
            strip_thumbnail_query_params("https://x.org/a.jpg?ss=1&size2=3"),
            "https://x.org/a.jpg?ss=1&size2=3"
        );
    }

    #[test]
    fn test_query_strip_keeps_other_params() {
        assert_eq!(
            strip_thumbnail_query_params("https://x.org/a.jpg?id=7&Width=100&token=a%20b"),
            "https://x.org/a.jpg?id=7&token=a%20b"
        );
        assert_eq!(
            strip_thumbnail_query_params("https://x.org/a.jpg?w=1&h=2"),
            "https://x.org/a.jpg"
        );
        assert_eq!(
            strip_thumbnail_query_params("https://x.org/a.jpg?id=7"),
            "https://x.org/a.jpg?id=7"
        );
    }

    #[test]
    fn test_query_variant_present_only_when_query_changes() {
        let with_keys = guess_fullsize_variants("https://x.org/a.jpg?size=large&id=3");
        assert!(with_keys.contains(&"https://x.org/a.jpg?id=3".to_string()));

        let without_keys = guess_fullsize_variants("https://x.org/a.jpg?id=3");
        assert_eq!(without_keys, vec!["https://x.org/a.jpg?id=3"]);
    }

    #[test]
    fn test_srcset_prefers_density() {
        let base = Url::parse("https://x.org/page").unwrap();
        assert_eq!(
            parse_srcset_best("a.jpg 1x, b.jpg 2x", &base).as_deref(),
            Some("https://x.org/b.jpg")
        );
    }

    #[test]
    fn test_srcset_width_and_ties() {
        let base = Url::parse("https://x.org/page").unwrap();
        assert_eq!(
            parse_srcset_best("a.jpg 100w, b.jpg 400w", &base).as_deref(),
            Some("https://x.org/b.jpg")
        );
        assert_eq!(
            parse_srcset_best("a.jpg 400w, b.jpg 400w", &base).as_deref(),
            Some("https://x.org/a.jpg")
        );
        assert_eq!(
            parse_srcset_best("a.jpg, b.jpg", &base).as_deref(),
            Some("https://x.org/a.jpg")
        );
        assert_eq!(parse_srcset_best(" , ", &base), None);
    }
}
