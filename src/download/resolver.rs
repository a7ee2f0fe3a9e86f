// src/download/resolver.rs
// =============================================================================
// Resolves one ImageCandidate into exactly one Outcome.
//
// The candidate's variants are a priority list. We walk it front to back:
//
//   pending variants -> try one -> Rejected(reason)  -> try the next
//                               -> Decided(outcome)  -> stop
//
// Running out of variants means FailedAllVariants.
//
// Keyword and profile skips are decided on the first variant without any
// network traffic. Content hashes are only recorded for images we accept
// (downloaded / would_download), so a duplicate never "claims" a hash.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use super::outcome::{Outcome, Resolution};
use crate::extract::url::{
    image_extension, looks_like_image_url, path_stem, redact_for_log, sanitize_name,
};
use crate::extract::{keyword_match, ImageCandidate, THUMB_HINTS};
use crate::fetch::{FetchError, Fetcher};

/// Settings that change how a variant is judged.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub dry_run: bool,
    /// Lowercase keywords; a variant URL containing one is skipped.
    pub skip_url_keywords: Vec<String>,
    /// Bodies below this size are rejected when the URL looks like a
    /// thumbnail. 0 turns the check off.
    pub min_thumbnail_bytes: usize,
}

// Why a single variant didn't work out
#[derive(Debug, Error)]
enum Rejection {
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("not an image (content-type {0:?})")]
    NotAnImage(String),
    #[error("empty body")]
    EmptyBody,
    #[error("{0} bytes, looks like a thumbnail")]
    TinyThumbnail(usize),
    #[error("could not save file: {0}")]
    WriteFailed(#[from] std::io::Error),
}

enum Step {
    Decided(Resolution),
    Rejected(Rejection),
}

// Tries the candidate's variants in order until one decides the outcome
//
// Parameters:
//   fetcher: where bytes come from
//   candidate: the image to resolve (consumed by reference, never mutated)
//   output_dir: folder for saved files (created on first save)
//   seen_hashes: SHA-256 digests of every image accepted so far in this crawl
//   options: dry-run / keywords / thumbnail threshold
pub async fn resolve_candidate<F: Fetcher + ?Sized>(
    fetcher: &F,
    candidate: &ImageCandidate,
    output_dir: &Path,
    seen_hashes: &mut HashSet<String>,
    options: &ResolveOptions,
) -> Resolution {
    for url in &candidate.variants {
        if keyword_match(url, options.skip_url_keywords.as_slice()) {
            return Resolution::without_fetch(Outcome::SkippedCustomKeyword);
        }
        if candidate.is_likely_profile {
            return Resolution::without_fetch(Outcome::SkippedProfile);
        }

        match try_variant(fetcher, url, output_dir, seen_hashes, options).await {
            Step::Decided(resolution) => return resolution,
            Step::Rejected(reason) => {
                debug!(url = %redact_for_log(url), reason = %reason, "variant rejected");
            }
        }
    }

    Resolution::without_fetch(Outcome::FailedAllVariants)
}

async fn try_variant<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    output_dir: &Path,
    seen_hashes: &mut HashSet<String>,
    options: &ResolveOptions,
) -> Step {
    let response = match fetcher.fetch(url).await {
        Ok(response) => response,
        Err(e) => return Step::Rejected(e.into()),
    };

    if response.is_error_status() {
        return Step::Rejected(Rejection::HttpStatus(response.status));
    }
    if !response.is_image() && !looks_like_image_url(url) {
        return Step::Rejected(Rejection::NotAnImage(response.content_type));
    }

    let body = response.body;
    if body.is_empty() {
        return Step::Rejected(Rejection::EmptyBody);
    }
    if body.len() < options.min_thumbnail_bytes && keyword_match(url, THUMB_HINTS) {
        return Step::Rejected(Rejection::TinyThumbnail(body.len()));
    }

    let digest = hex::encode(Sha256::digest(&body));
    let decided = |outcome: Outcome, saved_path: Option<PathBuf>| Resolution {
        outcome,
        chosen_url: Some(url.to_string()),
        saved_path,
        bytes: Some(body.len()),
        sha256: Some(digest.clone()),
    };

    if seen_hashes.contains(&digest) {
        return Step::Decided(decided(Outcome::Duplicate, None));
    }

    if options.dry_run {
        seen_hashes.insert(digest.clone());
        return Step::Decided(decided(Outcome::WouldDownload, None));
    }

    let path = output_dir.join(file_name(url, &response.content_type, &digest));
    if let Err(e) = save(&path, &body).await {
        return Step::Rejected(e.into());
    }
    seen_hashes.insert(digest.clone());
    Step::Decided(decided(Outcome::Downloaded, Some(path)))
}

async fn save(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}

/// `<sanitized-stem>_<first 12 hex chars of sha256><extension>`
pub fn file_name(url: &str, content_type: &str, digest: &str) -> PathBuf {
    let stem = match path_stem(url) {
        s if s.is_empty() => "image".to_string(),
        s => s,
    };
    let prefix = &digest[..digest.len().min(12)];
    PathBuf::from(format!(
        "{}_{}{}",
        sanitize_name(&stem),
        prefix,
        guess_extension(url, content_type)
    ))
}

// Picks a file extension: the URL's own, then the content type's, then .jpg
pub fn guess_extension(url: &str, content_type: &str) -> String {
    if let Some(ext) = image_extension(url) {
        return ext.to_string();
    }

    let mime = content_type.split(';').next().unwrap_or("").trim();
    let known = match mime {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        "image/bmp" => Some(".bmp"),
        "image/tiff" => Some(".tiff"),
        "image/svg+xml" => Some(".svg"),
        "image/avif" => Some(".avif"),
        "image/heic" => Some(".heic"),
        _ => None,
    };
    if let Some(ext) = known {
        return ext.to_string();
    }

    mime_guess::get_mime_extensions_str(mime)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| ".jpg".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;

    fn candidate(variants: &[&str], is_likely_profile: bool) -> ImageCandidate {
        ImageCandidate {
            page_url: "https://x.org/page".to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
            is_likely_profile,
        }
    }

    fn options(dry_run: bool) -> ResolveOptions {
        ResolveOptions {
            dry_run,
            skip_url_keywords: vec!["banner".to_string()],
            min_thumbnail_bytes: 512,
        }
    }

    #[tokio::test]
    async fn test_identical_bytes_from_two_urls_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new()
            .image("https://x.org/a.jpg", "image/jpeg", vec![7; 2000])
            .image("https://x.org/b.jpg", "image/jpeg", vec![7; 2000]);
        let mut seen = HashSet::new();

        let first = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/a.jpg"], false),
            dir.path(),
            &mut seen,
            &options(false),
        )
        .await;
        assert_eq!(first.outcome, Outcome::Downloaded);
        let saved = first.saved_path.unwrap();
        assert_eq!(std::fs::read(&saved).unwrap().len(), 2000);
        let name = saved.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("a_") && name.ends_with(".jpg"), "{name}");

        let second = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/b.jpg"], false),
            dir.path(),
            &mut seen,
            &options(false),
        )
        .await;
        assert_eq!(second.outcome, Outcome::Duplicate);
        assert_eq!(second.sha256, first.sha256);
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_failed_variants() {
        let fetcher = MockFetcher::new()
            .status("https://x.org/cat-thumb.jpg", 404)
            .image("https://x.org/cat.jpg", "image/jpeg", vec![1; 2000]);
        let mut seen = HashSet::new();

        let resolution = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/cat-thumb.jpg", "https://x.org/cat.jpg"], false),
            Path::new("unused"),
            &mut seen,
            &options(true),
        )
        .await;
        assert_eq!(resolution.outcome, Outcome::WouldDownload);
        assert_eq!(resolution.chosen_url.as_deref(), Some("https://x.org/cat.jpg"));
        assert_eq!(resolution.bytes, Some(2000));
        assert!(resolution.saved_path.is_none());
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_skips_happen_before_any_fetch() {
        let fetcher = MockFetcher::new().image("https://x.org/a.jpg", "image/jpeg", vec![1; 10]);
        let mut seen = HashSet::new();

        let profile = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/a.jpg"], true),
            Path::new("unused"),
            &mut seen,
            &options(true),
        )
        .await;
        assert_eq!(profile.outcome, Outcome::SkippedProfile);

        let keyword = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/Banner.jpg", "https://x.org/a.jpg"], false),
            Path::new("unused"),
            &mut seen,
            &options(true),
        )
        .await;
        assert_eq!(keyword.outcome, Outcome::SkippedCustomKeyword);
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_images_and_tiny_thumbnails() {
        let fetcher = MockFetcher::new()
            .image("https://x.org/view?id=1", "text/html", b"<html></html>".to_vec())
            .image("https://x.org/p_thumb.png", "image/png", vec![1; 100])
            .image("https://x.org/empty.png", "image/png", Vec::new());
        let mut seen = HashSet::new();

        let resolution = resolve_candidate(
            &fetcher,
            &candidate(
                &["https://x.org/view?id=1", "https://x.org/p_thumb.png", "https://x.org/empty.png"],
                false,
            ),
            Path::new("unused"),
            &mut seen,
            &options(true),
        )
        .await;
        assert_eq!(resolution.outcome, Outcome::FailedAllVariants);
        assert_eq!(fetcher.requested().len(), 3);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_fails_the_variant() {
        // A regular file where the output folder should be
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let output_dir = blocker.path().join("images");
        let fetcher = MockFetcher::new().image("https://x.org/a.jpg", "image/jpeg", vec![3; 2000]);
        let mut seen = HashSet::new();

        let resolution = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/a.jpg"], false),
            &output_dir,
            &mut seen,
            &options(false),
        )
        .await;
        assert_eq!(resolution.outcome, Outcome::FailedAllVariants);
        assert!(resolution.saved_path.is_none());
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_thumbnail_threshold_can_be_disabled() {
        let fetcher = MockFetcher::new().image("https://x.org/p_thumb.png", "image/png", vec![1; 100]);
        let mut seen = HashSet::new();
        let mut opts = options(true);
        opts.min_thumbnail_bytes = 0;

        let resolution = resolve_candidate(
            &fetcher,
            &candidate(&["https://x.org/p_thumb.png"], false),
            Path::new("unused"),
            &mut seen,
            &opts,
        )
        .await;
        assert_eq!(resolution.outcome, Outcome::WouldDownload);
    }

    #[test]
    fn test_extension_guessing() {
        assert_eq!(guess_extension("https://x.org/a.PNG", "image/jpeg"), ".png");
        assert_eq!(guess_extension("https://x.org/img?id=3", "image/webp; q=1"), ".webp");
        assert_eq!(guess_extension("https://x.org/img", ""), ".jpg");
    }

    #[test]
    fn test_file_name_uses_stem_and_hash_prefix() {
        let name = file_name("https://x.org/My Photo.JPG", "image/jpeg", "abcdef0123456789ff");
        assert_eq!(name, PathBuf::from("my_20photo_abcdef012345.jpg"));
        let name = file_name("https://x.org/", "image/png", "abcdef0123456789ff");
        assert_eq!(name, PathBuf::from("image_abcdef012345.png"));
    }
}
