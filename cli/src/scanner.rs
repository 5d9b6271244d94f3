//! Source tree discovery for the ctxpack CLI
//!
//! - Walking uses the `ignore` crate (respects .gitignore)
//! - File reading is parallelized with rayon
//! - Binary and non-UTF-8 files are skipped

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use ctxpack_engine::RawFile;

/// Configuration for source tree scanning
pub(crate) struct ScanConfig {
    /// Include hidden files (starting with .)
    pub include_hidden: bool,
    /// Respect .gitignore files
    pub respect_gitignore: bool,
    /// Maximum file size to include (bytes)
    pub max_file_size: u64,
    /// Paths never included, e.g. the artifact itself
    pub exclude: Vec<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            respect_gitignore: true,
            max_file_size: 50 * 1024 * 1024, // 50MB
            exclude: Vec::new(),
        }
    }
}

/// What discovery produced
pub(crate) struct ScanOutput {
    /// Readable text files, sorted by path
    pub files: Vec<RawFile>,
    /// Files skipped as binary, unreadable or too large
    pub skipped: usize,
}

/// Walk `root` and read every included text file
pub(crate) fn scan_directory(root: &Path, config: &ScanConfig) -> Result<ScanOutput> {
    let root = root.canonicalize().context("Invalid source path")?;
    let exclude: Vec<PathBuf> = config
        .exclude
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();

    // Phase 1: collect paths (sequential walk with ignore filtering)
    let mut candidates: Vec<(PathBuf, String)> = Vec::new();
    let mut skipped = 0;
    let walker = WalkBuilder::new(&root)
        .hidden(!config.include_hidden)
        .git_ignore(config.respect_gitignore)
        .git_global(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                skipped += 1;
                continue;
            },
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if exclude.iter().any(|e| *e == path) {
            continue;
        }
        if path.metadata().map(|m| m.len() > config.max_file_size).unwrap_or(true) {
            log::debug!("Skipping large or unreadable file {:?}", path);
            skipped += 1;
            continue;
        }
        candidates.push((path.clone(), relative_path(&root, &path)));
    }

    // Phase 2: read in parallel; order is restored by the sort below
    let total = candidates.len();
    let mut files: Vec<RawFile> = candidates
        .into_par_iter()
        .filter_map(|(path, relative)| read_text_file(&path).map(|c| RawFile::new(relative, c)))
        .collect();
    skipped += total - files.len();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    log::info!("Discovered {} files under {:?} ({} skipped)", files.len(), root, skipped);

    Ok(ScanOutput { files, skipped })
}

/// `/`-separated path of `path` relative to `root`
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a file as UTF-8 text, or `None` for binary or unreadable files
fn read_text_file(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Error reading {:?}: {}", path, e);
            return None;
        },
    };

    // NUL in the first 8KB is a strong binary signal
    if bytes.iter().take(8192).any(|b| *b == 0) {
        log::debug!("Skipping binary file {:?}", path);
        return None;
    }

    String::from_utf8(bytes)
        .map_err(|_| log::debug!("Skipping non-UTF-8 file {:?}", path))
        .ok()
}
