//! Source tree scanning for code-aware posts.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use crate::core::types::CodebaseSummary;

/// Characters read per file when counting lines.
pub const READ_CHAR_LIMIT: usize = 20_000;
pub const SAMPLE_FILE_LIMIT: usize = 20;
pub const TOP_EXTENSION_LIMIT: usize = 8;
pub const NO_EXTENSION: &str = "<noext>";

/// Summarize every file under `root`.
///
/// Links are not followed. A symlink to a directory is skipped; a symlink to
/// anything else counts as a file. Unreadable entries and files are skipped or
/// counted as empty; the scan itself never aborts. Files are visited in
/// file-name order.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn analyze(root: &Path) -> CodebaseSummary {
    let files: Vec<_> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(err = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(is_file_entry)
        .map(|entry| entry.into_path())
        .collect();

    let mut total_lines = 0usize;
    let mut counts = ExtensionCounts::default();
    for path in &files {
        let text = read_prefix(path, READ_CHAR_LIMIT).unwrap_or_else(|err| {
            debug!(path = %path.display(), err = %err, "treating unreadable file as empty");
            String::new()
        });
        total_lines += text.matches('\n').count() + 1;
        counts.add(&extension_label(path));
    }

    let summary = CodebaseSummary {
        file_count: files.len(),
        total_lines,
        top_extensions: counts.top(TOP_EXTENSION_LIMIT),
        sample_files: files
            .iter()
            .take(SAMPLE_FILE_LIMIT)
            .map(|path| path.display().to_string())
            .collect(),
    };
    debug!(
        file_count = summary.file_count,
        total_lines = summary.total_lines,
        "codebase analyzed"
    );
    summary
}

fn is_file_entry(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        return !entry.path().is_dir();
    }
    entry.file_type().is_file()
}

/// Read up to `limit` characters, decoding as UTF-8 and falling back to Latin-1.
pub fn read_prefix(path: &Path, limit: usize) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut bytes = Vec::new();
    // A UTF-8 character is at most four bytes.
    let cap = limit.saturating_mul(4);
    file.take(cap as u64)
        .read_to_end(&mut bytes)
        .with_context(|| format!("read {}", path.display()))?;

    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text.chars().take(limit).collect(),
        // Only the final character was cut by the byte cap.
        Err(err) if err.error_len().is_none() && bytes.len() == cap => {
            String::from_utf8_lossy(&bytes[..err.valid_up_to()])
                .chars()
                .take(limit)
                .collect()
        }
        Err(_) => bytes.iter().take(limit).map(|&b| char::from(b)).collect(),
    };
    Ok(text)
}

fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

/// Extension tallies that remember first-seen order for stable tie-breaking.
#[derive(Debug, Default)]
struct ExtensionCounts {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl ExtensionCounts {
    fn add(&mut self, ext: &str) {
        match self.index.get(ext) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(ext.to_string(), self.order.len());
                self.order.push((ext.to_string(), 1));
            }
        }
    }

    fn top(mut self, limit: usize) -> Vec<(String, usize)> {
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order.truncate(limit);
        self.order
    }
}
