// src/extract/mod.rs
// =============================================================================
// This module contains everything that reads a page without touching the
// network.
//
// Submodules:
// - url: normalizes links and answers "is this an image file?"
// - variants: guesses full-size URLs from thumbnail URLs
// - heuristics: avatar / next-page / content-link rules
// - candidates: walks a parsed page and builds ImageCandidates
//
// Everything here is a pure function over strings and scraper::Html, which
// makes it easy to unit test.
// =============================================================================

pub mod candidates;
pub mod heuristics;
pub mod url;
pub mod variants;

pub use candidates::{extract_image_candidates, ImageCandidate};
pub use heuristics::{discover_links, keyword_match, THUMB_HINTS};
