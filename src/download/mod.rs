// src/download/mod.rs
// =============================================================================
// This module decides what happens to each image candidate.
//
// Submodules:
// - outcome: the Outcome enum and the ManifestRow we write per candidate
// - resolver: tries variants in order, dedups by SHA-256, saves files
// =============================================================================

mod outcome;
mod resolver;

pub use outcome::{ManifestRow, Outcome, Resolution};
pub use resolver::{resolve_candidate, ResolveOptions};
