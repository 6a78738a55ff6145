//! Repository side of the tracker: where annotations go.
//!
//! The tracker forwards a note for every notification it receives. The
//! [`Repository`] trait is the only thing the engine knows about; the
//! version-control layer behind it decides what to do with the notes.
//!
//! # Submodules
//!
//! - [`events`] - Annotation rows
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - SQLite-backed repository

pub mod events;
pub mod schema;
pub mod sqlite;

use crate::error::Result;
use crate::model::EntityId;

pub use events::Annotation;
pub use sqlite::SqliteRepository;

/// Sink for per-entity annotations.
pub trait Repository {
    /// Attach `message` to `entity` for inclusion in future history.
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be stored.
    fn add_auto_comment(&mut self, entity: EntityId, message: &str) -> Result<()>;
}
