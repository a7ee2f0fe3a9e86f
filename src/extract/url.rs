// src/extract/url.rs
// =============================================================================
// URL normalization helpers.
//
// Every link we find on a page goes through normalize_url() before we use it
// as a set key or hand it to the fetcher. A normalized URL is:
// - absolute (resolved against the page it was found on)
// - http or https only
// - fragment-free (#section is dropped)
//
// Rust concepts:
// - Option<T>: "no URL" is None, not an empty string
// - Borrowing: we take &str and &Url, we only allocate the final String
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// File extensions we treat as "this is an image file".
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tif", ".tiff", ".svg", ".avif", ".heic",
];

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9._-]+").expect("valid name regex"));

// Resolves a raw href/src value against the page URL
//
// Returns None for:
// - empty strings
// - javascript:, mailto:, tel: links
// - pure fragments ("#top")
// - anything that doesn't end up as http/https
//
// Examples:
//   base = "https://example.com/blog/page"
//   raw  = "../img/a.jpg#zoom" -> Some("https://example.com/img/a.jpg")
//   raw  = "mailto:me@x.org"   -> None
pub fn normalize_url(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with('#')
    {
        return None;
    }

    let mut joined = base.join(raw).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    Some(joined.to_string())
}

// Same as normalize_url, but for a string that should already be absolute
// (start URLs from the command line)
pub fn normalize_absolute(raw: &str) -> Option<String> {
    let base = Url::parse(raw.trim()).ok()?;
    normalize_url(raw, &base)
}

/// Host used for scoping and for the per-host output folder.
///
/// The port is kept when it isn't the scheme default, so
/// `http://localhost:8080` and `http://localhost:9090` are different hosts.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// True when the URL path ends in a known image extension.
pub fn looks_like_image_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path().to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        }
        Err(_) => false,
    }
}

/// The image extension of the URL path, lowercased with the leading dot.
pub fn image_extension(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| path.ends_with(ext))
}

// Last path segment without its extension ("/a/cat.large.jpg" -> "cat.large")
pub fn path_stem(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => return String::new(),
    };
    let file = path.rsplit('/').next().unwrap_or("");
    match file.rfind('.') {
        Some(idx) if idx > 0 => file[..idx].to_string(),
        _ => file.to_string(),
    }
}

/// Makes a string safe to use as a file or folder name.
///
/// Lowercases, collapses runs of anything outside `[a-z0-9._-]` into `_`,
/// and trims leading/trailing dots and underscores. Never returns "".
pub fn sanitize_name(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let replaced = UNSAFE_NAME_CHARS.replace_all(&lowered, "_");
    let trimmed = replaced.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}

// A URL that is safe to write to the logs
//
// Query strings and credentials often carry session tokens, so they are
// cut off. A "?..." marker shows that a query was there.
//   "https://u:p@x.org/t/1?sid=abc#r" -> "https://x.org/t/1?..."
pub fn redact_for_log(url: &str) -> String {
    let mut parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return "[invalid url]".to_string(),
    };
    let had_query = parsed.query().is_some();
    parsed.set_query(None);
    parsed.set_fragment(None);
    // Only fails for URLs that can't carry credentials anyway
    let _ = parsed.set_username("");
    let _ = parsed.set_password(None);

    if had_query {
        format!("{}?...", parsed)
    } else {
        parsed.to_string()
    }
}
