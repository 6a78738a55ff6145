//! Replay command implementation.
//!
//! Drives one full tracking cycle from files: the snapshot stands in for the
//! live database after the mutations, the notification log for the host's
//! callbacks. Every notification goes through intake, then one save writes
//! the cache next to the snapshot's database path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::database::{Database, MemoryDatabase};
use crate::error::{Error, Result};
use crate::hooks::{Hooks, PendingCounts};
use crate::model::Notification;
use crate::storage::SqliteRepository;
use crate::sync::{ExportStats, JsonlPipeline};

#[derive(Serialize)]
struct ReplayOutput {
    success: bool,
    cache_dir: String,
    annotations_db: String,
    notifications: usize,
    stats: ExportStats,
    pending: PendingCounts,
    flushed: bool,
}

/// Parse a notification log.
///
/// One JSON object per line; blank lines and lines starting with `#` are
/// skipped. The whole log is parsed before anything is applied.
///
/// # Errors
///
/// Returns an error if the file is missing or a line is not a notification.
pub fn read_notifications(path: &Path) -> Result<Vec<Notification>> {
    if !path.exists() {
        return Err(Error::EventsNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let mut notifications = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let notification = serde_json::from_str(line).map_err(|e| Error::InvalidNotification {
            line: index + 1,
            message: e.to_string(),
        })?;
        notifications.push(notification);
    }
    Ok(notifications)
}

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if an input cannot be read, an annotation cannot be
/// stored, or the save fails.
pub fn execute(
    snapshot: &Path,
    events: &Path,
    no_flush: bool,
    config: Config,
    json: bool,
) -> Result<()> {
    let database = MemoryDatabase::load(snapshot)?;
    let notifications = read_notifications(events)?;

    let annotations_path = config.annotations_path(&database.database_path());
    let repository = SqliteRepository::open(&annotations_path)?;

    let mut hooks = Hooks::new(database, repository, JsonlPipeline::new()).with_config(config);
    let cache_dir: PathBuf = hooks.cache_dir();

    let count = notifications.len();
    for notification in notifications {
        hooks.notify(notification)?;
    }
    info!(count, "Notifications applied");

    let stats = hooks.save()?;
    if !no_flush {
        hooks.flush();
    }
    let pending = hooks.pending();

    if json {
        let output = ReplayOutput {
            success: true,
            cache_dir: cache_dir.display().to_string(),
            annotations_db: annotations_path.display().to_string(),
            notifications: count,
            stats,
            pending,
            flushed: !no_flush,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Replayed {count} notifications");
    println!();
    if stats.is_empty() {
        println!("No records exported.");
    } else {
        print_count("Addresses", stats.addresses);
        print_count("Structures", stats.structures);
        print_count("Members", stats.members);
        print_count("Enums", stats.enums);
        print_count("Segments", stats.segments);
        print_count("Functions", stats.functions);
        print_count("Deletions", stats.deletions);
        println!();
        println!("  Total: {} records", stats.total_with_deletions());
    }
    println!("  Location: {}", cache_dir.display());
    if no_flush {
        println!("  Pending: {} entries kept", pending.total());
    }

    Ok(())
}

fn print_count(label: &str, count: usize) {
    if count > 0 {
        println!("  {:<12}{count}", format!("{label}:"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_notifications_skips_blank_and_comment_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        fs::write(
            &path,
            "# session 1\n{\"kind\":\"code_created\",\"ea\":4096}\n\n{\"kind\":\"comment_changed\",\"ea\":8192}\n",
        )
        .unwrap();

        let notifications = read_notifications(&path).unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].kind(), "code_created");
    }

    #[test]
    fn test_read_notifications_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        fs::write(&path, "{\"kind\":\"code_created\",\"ea\":1}\n{\"kind\":\"bogus\"}\n").unwrap();

        let err = read_notifications(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidNotification { line: 2, .. }));
    }

    #[test]
    fn test_read_notifications_missing_file() {
        let err = read_notifications(Path::new("/nonexistent/events.jsonl")).unwrap_err();
        assert!(matches!(err, Error::EventsNotFound { .. }));
    }
}
