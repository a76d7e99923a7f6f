//! Result files.
//!
//! A plain crawl writes one YAML listing of `{url, title}` records. Extraction
//! mode writes one pretty-printed JSON file per page into the pages directory.

use anyhow::{Context, Result};
use log::info;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::crawl_engine::Page;
use crate::page_extractor::PageElements;
use crate::utils::sanitize_page_name;

/// Fallback stem for an untitled page in plain extraction.
pub const UNTITLED_PAGE: &str = "untitled_page";

/// Fallback stem for an untitled page when exploration is on.
pub const DEFAULT_PAGE_STEM: &str = "page";

/// Write the page listing as a YAML sequence, creating parent directories.
///
/// # Errors
///
/// Fails when the file cannot be serialized or written.
pub async fn write_pages_yaml(path: &Path, pages: &[Page]) -> Result<()> {
    let yaml = serde_yaml::to_string(pages).context("Failed to serialize page listing")?;
    ensure_parent(path).await?;
    tokio::fs::write(path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        target: "sitescout::crawl",
        "Wrote {} pages to {}",
        pages.len(),
        path.display()
    );
    Ok(())
}

/// Write one page's elements to `<dir>/<stem>.json` and return the path.
///
/// # Errors
///
/// Fails when the directory cannot be created or the file written.
pub async fn write_page_elements(dir: &Path, stem: &str, record: &PageElements) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{stem}.json"));
    let json = serde_json::to_string_pretty(record).context("Failed to serialize elements")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// File stem for a page: the custom name made filesystem-safe, or else the
/// sanitized title, or else `fallback`.
#[must_use]
pub fn page_file_stem(custom: Option<&str>, title: &str, fallback: &str) -> String {
    if let Some(name) = custom.map(str::trim).filter(|n| !n.is_empty()) {
        let safe = sanitize_filename::sanitize(name);
        if !safe.trim().is_empty() {
            return safe;
        }
    }
    sanitize_page_name(title, fallback)
}

/// Stems already written in this run. Repeats get `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct StemRegistry {
    used: HashSet<String>,
}

impl StemRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `stem`, or the first free suffixed variant of it.
    pub fn claim(&mut self, stem: &str) -> String {
        if self.used.insert(stem.to_string()) {
            return stem.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{stem}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}
