//! Status command implementation.

use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::database::{Database, MemoryDatabase};
use crate::error::Result;
use crate::storage::SqliteRepository;
use crate::sync::{CacheStatus, cache_status, print_status};

#[derive(Serialize)]
struct StatusOutput {
    database: String,
    cache: CacheStatus,
    pending_annotations: usize,
}

/// Execute the status command.
///
/// Reports the cache next to the snapshot's database and the number of
/// annotations not yet committed. A missing annotation database counts as
/// zero pending and is not created.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or a cache file or the
/// annotation database cannot be read.
pub fn execute(snapshot: &Path, config: &Config, json: bool) -> Result<()> {
    let database = MemoryDatabase::load(snapshot)?;
    let database_path = database.database_path();
    let status = cache_status(&config.cache_dir(&database_path))?;

    let annotations_path = config.annotations_path(&database_path);
    let pending_annotations = if annotations_path.exists() {
        SqliteRepository::open(&annotations_path)?
            .pending_annotations()?
            .len()
    } else {
        0
    };

    if json {
        let output = StatusOutput {
            database: database_path.display().to_string(),
            cache: status,
            pending_annotations,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    print_status(&status);
    println!();
    println!("Pending annotations: {pending_annotations}");
    Ok(())
}
