//! The change tracker.
//!
//! [`Hooks`] sits between a live analysis database and the export cache:
//!
//! 1. The host calls one intake method per mutation (`rename`,
//!    `structure_updated`, ...); the entity is recorded in the [`DirtySet`]
//!    and a note goes to the repository.
//! 2. The caller asks for a [`Hooks::save`]; every pending entity is checked
//!    against the database's current state and the outcome
//!    (update, delete, frame attribution) is fed to one export session, which
//!    is then serialized into the cache directory.
//! 3. The caller clears pending state with [`Hooks::flush`] once the save is
//!    committed. A failed save keeps everything for a retry.
//!
//! All three run on the host's thread. `&mut self` on each entry point is what
//! keeps notifications from landing in the middle of a save.

pub mod dirty;
mod intake;
mod reconcile;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::database::Database;
use crate::error::Result;
use crate::storage::Repository;
use crate::sync::{ExportPipeline, ExportStats, ExportVisitor, JsonlPipeline};

pub use dirty::{DirtySet, PendingCounts, PendingMember};
pub use intake::rename_message;

/// Incremental change tracker over a host database.
#[derive(Debug)]
pub struct Hooks<D, R, P = JsonlPipeline> {
    database: D,
    repository: R,
    pipeline: P,
    config: Config,
    dirty: DirtySet,
}

impl<D, R, P> Hooks<D, R, P> {
    /// Create a tracker with default configuration and nothing pending.
    pub fn new(database: D, repository: R, pipeline: P) -> Self {
        Self {
            database,
            repository,
            pipeline,
            config: Config::default(),
            dirty: DirtySet::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    /// Host-side access to the database, e.g. to apply the mutations being
    /// notified. The tracker itself only ever queries it.
    pub fn database_mut(&mut self) -> &mut D {
        &mut self.database
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    /// Pending changes.
    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    /// Pending entry counts per collection.
    pub fn pending(&self) -> PendingCounts {
        self.dirty.counts()
    }

    /// Whether nothing is pending.
    pub fn is_clean(&self) -> bool {
        self.dirty.is_empty()
    }

    /// Drop all pending changes.
    ///
    /// Independent of [`Hooks::save`]: call it once the saved cache has been
    /// committed. Calling it again is a no-op.
    pub fn flush(&mut self) {
        self.dirty.clear();
    }
}

impl<D: Database, R, P> Hooks<D, R, P> {
    /// Cache directory for the current database.
    pub fn cache_dir(&self) -> PathBuf {
        self.config.cache_dir(&self.database.database_path())
    }
}

impl<D: Database, R: Repository, P: ExportPipeline> Hooks<D, R, P> {
    /// Reconcile every pending change and serialize it into the cache.
    ///
    /// Order: comments are folded into addresses, then structures, structure
    /// members, enums, addresses and segments are visited in one session,
    /// which is serialized into [`Hooks::cache_dir`].
    ///
    /// Pending state is left untouched, whether the save succeeds or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects a comment note, or if the
    /// export session or its serialization fails.
    pub fn save(&mut self) -> Result<ExportStats> {
        let started = Instant::now();
        let cache_dir = self.cache_dir();

        let mut addresses = self.promote_comments()?;

        let mut session = self.pipeline.open_session();
        session.visit_start()?;

        addresses.extend(self.reconcile_structures(&mut session)?);
        self.reconcile_structure_members(&mut session)?;
        self.reconcile_enums(&mut session)?;
        self.reconcile_enum_members();

        for ea in &addresses {
            session.export_address(*ea)?;
        }

        for (start, end) in self.dirty.segments() {
            session.export_segment(start, end)?;
        }

        session.visit_end()?;

        let stats = self.pipeline.serialize(session, &cache_dir)?;

        info!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            exported = stats.total(),
            deleted = stats.deletions,
            cache_dir = %cache_dir.display(),
            "Saved"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingPipeline, tracker};
    use super::*;
    use crate::database::MemoryDatabase;
    use crate::model::{Address, EnumId, StructId};
    use crate::storage::SqliteRepository;
    use crate::sync::{ExportRecord, read_jsonl};
    use tempfile::TempDir;

    #[test]
    fn test_flush_without_save_exports_nothing() {
        let mut hooks = tracker(MemoryDatabase::new("/work/a.idb"));
        hooks.code_created(Address(0x10)).unwrap();
        hooks.structure_updated(StructId(0xff00)).unwrap();
        hooks.comment_changed(Address(0x20));
        hooks.segment_added(Address(0x1000), Address(0x2000));

        hooks.flush();
        assert!(hooks.is_clean());

        hooks.save().unwrap();
        assert!(hooks.pipeline().last().is_empty());
    }

    #[test]
    fn test_flush_is_idempotent() {
        let mut hooks = tracker(MemoryDatabase::new("/work/a.idb"));
        hooks.enum_updated(EnumId(5)).unwrap();

        hooks.flush();
        let once = hooks.dirty().clone();
        hooks.flush();

        assert_eq!(hooks.dirty(), &once);
        assert!(hooks.is_clean());
    }

    #[test]
    fn test_save_does_not_clear_pending() {
        let mut hooks = tracker(MemoryDatabase::new("/work/a.idb"));
        hooks.data_created(Address(0x40)).unwrap();

        hooks.save().unwrap();
        hooks.save().unwrap();

        assert!(hooks.dirty().contains_address(Address(0x40)));
        assert_eq!(hooks.pipeline().save_count(), 2);
    }

    #[test]
    fn test_failed_save_keeps_state_for_retry() {
        let mut hooks = tracker(MemoryDatabase::new("/work/a.idb"));
        hooks.code_created(Address(0x40)).unwrap();
        hooks.comment_changed(Address(0x50));
        let before = hooks.dirty().clone();

        hooks.pipeline_mut().fail_serialize = true;
        let err = hooks.save().unwrap_err();
        assert!(matches!(err, crate::error::Error::Sync(_)));
        assert_eq!(hooks.dirty(), &before);

        hooks.pipeline_mut().fail_serialize = false;
        hooks.save().unwrap();
        assert_eq!(
            hooks.pipeline().last(),
            vec![
                ExportRecord::Address { ea: Address(0x40) },
                ExportRecord::Address { ea: Address(0x50) },
            ]
        );
    }

    #[test]
    fn test_save_targets_sibling_cache_dir() {
        let mut hooks = tracker(MemoryDatabase::new("/work/re/target.idb"));
        hooks.save().unwrap();
        assert_eq!(
            hooks.pipeline().last_target(),
            Some(PathBuf::from("/work/re/cache"))
        );
    }

    #[test]
    fn test_save_with_jsonl_pipeline_writes_cache() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = MemoryDatabase::new(temp_dir.path().join("target.idb"));
        db.add_struct(StructId(0xff00), "Point");
        let mut hooks = Hooks::new(db, SqliteRepository::open_memory().unwrap(), JsonlPipeline::new());

        hooks.code_created(Address(0x401000)).unwrap();
        hooks.structure_updated(StructId(0xff00)).unwrap();
        hooks.structure_updated(StructId(0xff10)).unwrap();

        let stats = hooks.save().unwrap();
        assert_eq!(stats.addresses, 1);
        assert_eq!(stats.structures, 1);
        assert_eq!(stats.deletions, 1);

        let cache = temp_dir.path().join("cache");
        assert_eq!(read_jsonl(&cache.join("addresses.jsonl")).unwrap().len(), 1);
        assert_eq!(read_jsonl(&cache.join("structures.jsonl")).unwrap().len(), 1);
        let deletions = read_jsonl(&cache.join("deletions.jsonl")).unwrap();
        assert_eq!(
            deletions[0].record,
            ExportRecord::StructDeleted { id: StructId(0xff10) }
        );
    }

    #[test]
    fn test_repeated_save_logs_deletion_once() {
        let temp_dir = TempDir::new().unwrap();
        let db = MemoryDatabase::new(temp_dir.path().join("target.idb"));
        let mut hooks = Hooks::new(db, SqliteRepository::open_memory().unwrap(), JsonlPipeline::new());

        hooks.structure_updated(StructId(0xff10)).unwrap();
        hooks.save().unwrap();
        hooks.save().unwrap();

        let deletions = read_jsonl(&temp_dir.path().join("cache").join("deletions.jsonl")).unwrap();
        assert_eq!(deletions.len(), 1);
        assert_eq!(
            deletions[0].record,
            ExportRecord::StructDeleted { id: StructId(0xff10) }
        );
    }

    #[test]
    fn test_custom_cache_dir_name() {
        let config = Config::default().with_cache_dir_name("yacache").unwrap();
        let hooks = Hooks::new(
            MemoryDatabase::new("/work/target.idb"),
            SqliteRepository::open_memory().unwrap(),
            RecordingPipeline::default(),
        )
        .with_config(config);
        assert_eq!(hooks.cache_dir(), PathBuf::from("/work/yacache"));
    }
}
