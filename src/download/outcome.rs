// src/download/outcome.rs
// =============================================================================
// The result types of resolving one image candidate.
//
// Outcome is what happened; ManifestRow is the line we write about it.
// Both derive Serialize so the csv crate can write them directly.
// =============================================================================

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Downloaded,
    WouldDownload,
    Duplicate,
    SkippedProfile,
    SkippedCustomKeyword,
    FailedAllVariants,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Downloaded => "downloaded",
            Outcome::WouldDownload => "would_download",
            Outcome::Duplicate => "duplicate",
            Outcome::SkippedProfile => "skipped_profile",
            Outcome::SkippedCustomKeyword => "skipped_custom_keyword",
            Outcome::FailedAllVariants => "failed_all_variants",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the resolver decided for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    /// The variant that decided the outcome, if a fetch decided it.
    pub chosen_url: Option<String>,
    pub saved_path: Option<PathBuf>,
    pub bytes: Option<usize>,
    pub sha256: Option<String>,
}

impl Resolution {
    pub fn without_fetch(outcome: Outcome) -> Self {
        Self {
            outcome,
            chosen_url: None,
            saved_path: None,
            bytes: None,
            sha256: None,
        }
    }
}

/// One line of manifest.csv.
///
/// Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRow {
    pub page_url: String,
    pub image_url: String,
    pub status: Outcome,
    pub saved_path: Option<String>,
    pub bytes: Option<usize>,
    pub sha256: Option<String>,
    pub variant_count: usize,
}

impl ManifestRow {
    pub fn new(page_url: &str, first_url: &str, variant_count: usize, resolution: Resolution) -> Self {
        Self {
            page_url: page_url.to_string(),
            image_url: resolution.chosen_url.unwrap_or_else(|| first_url.to_string()),
            status: resolution.outcome,
            saved_path: resolution.saved_path.map(|p| p.display().to_string()),
            bytes: resolution.bytes,
            sha256: resolution.sha256,
            variant_count,
        }
    }
}
