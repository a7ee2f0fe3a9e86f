// src/manifest.rs
// =============================================================================
// The manifest: one CSV row per image candidate we made a decision about.
//
// The crawler only knows about the ManifestSink trait, so tests can collect
// rows in a Vec instead of writing a file.
//
// CsvManifest flushes after every row. If the crawl is interrupted, the
// file still describes everything that happened up to that point.
// =============================================================================

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::download::ManifestRow;

pub trait ManifestSink {
    fn append(&mut self, row: &ManifestRow) -> Result<()>;
}

pub struct CsvManifest {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvManifest {
    // Creates (or truncates) the manifest and writes the header row
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Headers come from ManifestRow's field names on the first serialize;
        // write them explicitly so an empty crawl still gets a header line.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to create manifest {}", path.display()))?;
        writer.write_record([
            "page_url",
            "image_url",
            "status",
            "saved_path",
            "bytes",
            "sha256",
            "variant_count",
        ])?;
        writer.flush()?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSink for CsvManifest {
    fn append(&mut self, row: &ManifestRow) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        self.writer.flush()?;
        Ok(())
    }
}

impl ManifestSink for Vec<ManifestRow> {
    fn append(&mut self, row: &ManifestRow) -> Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{Outcome, Resolution};

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("manifest.csv");

        let mut manifest = CsvManifest::create(&path).unwrap();
        manifest
            .append(&ManifestRow::new(
                "https://x.org/p",
                "https://x.org/a.jpg",
                2,
                Resolution {
                    outcome: Outcome::WouldDownload,
                    chosen_url: Some("https://x.org/a,b.jpg".to_string()),
                    saved_path: None,
                    bytes: Some(2000),
                    sha256: Some("ab12".to_string()),
                },
            ))
            .unwrap();
        assert_eq!(manifest.path(), path.as_path());

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "page_url,image_url,status,saved_path,bytes,sha256,variant_count");
        assert_eq!(
            lines[1],
            "https://x.org/p,\"https://x.org/a,b.jpg\",would_download,,2000,ab12,2"
        );
    }

    #[test]
    fn test_empty_crawl_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        CsvManifest::create(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
