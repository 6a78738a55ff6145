//! Cache file operations.
//!
//! Cache files are rewritten whole on every save that changes them. Writes go
//! through a temp file plus rename so an interrupted save never leaves a
//! half-written JSONL file for git to pick up.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::sync::types::{CacheLine, SyncError, SyncResult};

/// Write content to a file atomically.
///
/// The content goes to `<path>.tmp`, is synced to disk, then renamed over
/// `path`. On failure the previous file (if any) is untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> SyncResult<()> {
    let temp_path = path.with_extension("jsonl.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Render cache lines as JSONL text, one record per line.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn render_jsonl(lines: &[CacheLine]) -> SyncResult<String> {
    let mut content = String::new();
    for line in lines {
        content.push_str(&serde_json::to_string(line)?);
        content.push('\n');
    }
    Ok(content)
}

/// Read all cache lines from a JSONL file.
///
/// Blank lines are skipped. An unparsable line fails the whole read with its
/// 1-indexed line number.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or malformed.
pub fn read_jsonl(path: &Path) -> SyncResult<Vec<CacheLine>> {
    if !path.exists() {
        return Err(SyncError::FileNotFound(path.display().to_string()));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed: CacheLine =
            serde_json::from_str(&line).map_err(|e| SyncError::InvalidRecord {
                line: line_num + 1,
                message: e.to_string(),
            })?;
        lines.push(parsed);
    }

    Ok(lines)
}

/// Read a cache file, treating a missing file as empty.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read or parsed.
pub fn read_jsonl_or_empty(path: &Path) -> SyncResult<Vec<CacheLine>> {
    match read_jsonl(path) {
        Err(SyncError::FileNotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}

/// Count the number of lines in a JSONL file. Missing files count as zero.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn count_lines(path: &Path) -> SyncResult<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let reader = BufReader::new(File::open(path)?);
    Ok(reader.lines().filter(Result::is_ok).count())
}

/// Get the size of a file in bytes, or 0 if it doesn't exist.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// `.gitignore` for the cache directory.
///
/// Whitelist pattern: only the JSONL files are versioned, never temp files or
/// the annotation database.
#[must_use]
pub fn gitignore_content() -> &'static str {
    r"# Change-tracker cache
# Whitelist pattern: ignore everything except JSONL export files

*
!.gitignore
!*.jsonl
"
}

/// Create the cache `.gitignore` unless one already exists.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn ensure_gitignore(cache_dir: &Path) -> SyncResult<()> {
    let gitignore_path = cache_dir.join(".gitignore");

    if gitignore_path.exists() {
        return Ok(());
    }

    fs::create_dir_all(cache_dir)?;

    let mut file = File::create(&gitignore_path)?;
    file.write_all(gitignore_content().as_bytes())?;
    file.sync_all()?;

    Ok(())
}
