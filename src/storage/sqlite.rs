//! SQLite-backed repository.
//!
//! Stores annotations until the version-control side consumes them as commit
//! history. Pending annotations are turned into a commit message with
//! [`SqliteRepository::commit_message`] and then marked committed.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use super::Repository;
use crate::error::Result;
use crate::model::EntityId;
use crate::storage::events::{Annotation, get_annotations, get_pending, insert_annotation};
use crate::storage::schema::apply_schema;

/// Annotation store on top of a SQLite connection.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) an annotation database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Most recent annotations for `entity`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn annotations_for(&self, entity: EntityId, limit: Option<u32>) -> Result<Vec<Annotation>> {
        Ok(get_annotations(&self.conn, entity, limit)?)
    }

    /// Annotations not yet consumed by a commit, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn pending_annotations(&self) -> Result<Vec<Annotation>> {
        Ok(get_pending(&self.conn)?)
    }

    /// Build a commit message from pending annotations.
    ///
    /// One line per annotation, `<entity>: <message>`, in arrival order.
    /// Returns `None` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn commit_message(&self) -> Result<Option<String>> {
        let pending = self.pending_annotations()?;
        if pending.is_empty() {
            return Ok(None);
        }
        let lines: Vec<String> = pending
            .iter()
            .map(|a| format!("{}: {}", a.entity_id, a.message))
            .collect();
        Ok(Some(lines.join("\n")))
    }

    /// Mark every pending annotation as committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn mark_committed(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let count = tx.execute("UPDATE annotations SET committed = 1 WHERE committed = 0", [])?;
        tx.commit()?;
        debug!(count, "Annotations marked committed");
        Ok(count)
    }
}

impl Repository for SqliteRepository {
    fn add_auto_comment(&mut self, entity: EntityId, message: &str) -> Result<()> {
        insert_annotation(&self.conn, &Annotation::new(entity, message))?;
        Ok(())
    }
}
