//! Cache status display.
//!
//! Reports which cache files exist next to a database and how many records
//! each holds. Pending (not yet saved) changes live only in the running
//! tracker, so they are not part of this report.

use std::path::Path;

use colored::Colorize;

use crate::sync::file::{count_lines, file_size};
use crate::sync::types::{CacheFile, CacheFileInfo, CacheStatus, SyncResult};

/// Inspect the cache directory.
///
/// # Errors
///
/// Returns an error if an existing cache file cannot be read.
pub fn cache_status(cache_dir: &Path) -> SyncResult<CacheStatus> {
    let mut files = Vec::new();
    for file in CacheFile::ALL {
        let path = cache_dir.join(file.file_name());
        if path.exists() {
            files.push(CacheFileInfo {
                name: file.file_name().to_string(),
                size: file_size(&path),
                line_count: count_lines(&path)?,
            });
        }
    }

    Ok(CacheStatus {
        cache_dir: cache_dir.display().to_string(),
        exists: cache_dir.is_dir(),
        files,
    })
}

/// Print cache status to stdout in a human-readable format.
pub fn print_status(status: &CacheStatus) {
    println!("{}", "Cache Status".bold().underline());
    println!();
    println!("  Location: {}", status.cache_dir);
    println!();

    if !status.exists {
        println!("{}", "No cache directory yet.".dimmed());
        println!("{}", "Run 'ct replay' to perform a first save.".dimmed());
        return;
    }

    if status.files.is_empty() {
        println!("{}", "Cache is empty.".dimmed());
        return;
    }

    println!("{}", "Cache Files:".blue().bold());
    for file in &status.files {
        println!(
            "  {} ({}, {} records)",
            file.name,
            format_size(file.size),
            file.line_count
        );
    }
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
