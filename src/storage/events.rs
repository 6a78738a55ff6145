//! Annotation rows.
//!
//! Annotations are the human-readable notes the tracker attaches to entities
//! when a notification arrives ("function renamed from sub_401000 to main").
//! They are written immediately because the context they describe (old names,
//! previous values) is gone by save time.

use rusqlite::{Connection, Result, Row};

use crate::model::EntityId;

/// An annotation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: i64,
    pub entity_id: EntityId,
    pub message: String,
    pub created_at: i64,
    pub committed: bool,
}

impl Annotation {
    /// Create a new annotation (id will be assigned by database).
    #[must_use]
    pub fn new(entity_id: EntityId, message: &str) -> Self {
        Self {
            id: 0,
            entity_id,
            message: message.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
            committed: false,
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn to_sql_id(id: EntityId) -> i64 {
    id.0 as i64
}

#[allow(clippy::cast_sign_loss)]
const fn from_sql_id(raw: i64) -> EntityId {
    EntityId(raw as u64)
}

/// Insert an annotation.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_annotation(conn: &Connection, annotation: &Annotation) -> Result<i64> {
    conn.execute(
        "INSERT INTO annotations (entity_id, message, created_at, committed)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            to_sql_id(annotation.entity_id),
            annotation.message,
            annotation.created_at,
            annotation.committed,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent annotations for an entity, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_annotations(conn: &Connection, entity_id: EntityId, limit: Option<u32>) -> Result<Vec<Annotation>> {
    let limit = limit.unwrap_or(100);
    let mut stmt = conn.prepare(
        "SELECT id, entity_id, message, created_at, committed
         FROM annotations
         WHERE entity_id = ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(rusqlite::params![to_sql_id(entity_id), limit], map_row)?;
    rows.collect()
}

/// Annotations not yet consumed by a commit, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_pending(conn: &Connection) -> Result<Vec<Annotation>> {
    let mut stmt = conn.prepare(
        "SELECT id, entity_id, message, created_at, committed
         FROM annotations
         WHERE committed = 0
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], map_row)?;
    rows.collect()
}

fn map_row(row: &Row) -> Result<Annotation> {
    Ok(Annotation {
        id: row.get(0)?,
        entity_id: from_sql_id(row.get(1)?),
        message: row.get(2)?,
        created_at: row.get(3)?,
        committed: row.get(4)?,
    })
}
