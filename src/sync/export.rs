//! JSONL export pipeline.
//!
//! # Snapshot Mode
//!
//! The cache directory holds the latest exported state of every entity the
//! tracker has ever touched, one JSONL file per kind. A save merges its
//! records into that state:
//!
//! - updates replace the line with the same key (or add one)
//! - deletions drop the key from the live file and append to
//!   `deletions.jsonl`, which accumulates like a log; a deletion already
//!   logged for a key that is no longer live is not appended again
//! - deleting a structure also drops its members
//!
//! Lines whose record is unchanged keep their earlier `exported_at`, and files
//! whose content is unchanged are not rewritten, so git only sees real change.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::Utc;
use tracing::{debug, trace};

use crate::model::{Address, EnumId, MemberId, StructId};
use crate::sync::file::{atomic_write, ensure_gitignore, read_jsonl_or_empty, render_jsonl};
use crate::sync::hash::{content_hash, file_hash, has_changed, text_hash};
use crate::sync::types::{
    CacheFile, CacheLine, ExportRecord, ExportStats, RecordKey, SyncError, SyncResult,
};
use crate::sync::visitor::{ExportPipeline, ExportVisitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SessionState {
    #[default]
    Idle,
    Open,
    Finished,
}

/// In-memory export session.
///
/// Records every visitor call between `visit_start` and `visit_end`. A record
/// identical to one already captured is dropped, so an entity reached through
/// two reconciliation paths is exported once.
#[derive(Debug, Default)]
pub struct ModelSession {
    state: SessionState,
    records: Vec<ExportRecord>,
    seen: HashSet<ExportRecord>,
}

impl ModelSession {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records captured so far, in visit order.
    #[must_use]
    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    /// Whether `visit_end` has been called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    fn push(&mut self, record: ExportRecord) -> SyncResult<()> {
        match self.state {
            SessionState::Idle => return Err(SyncError::SessionNotStarted),
            SessionState::Finished => return Err(SyncError::SessionClosed),
            SessionState::Open => {}
        }
        if self.seen.insert(record.clone()) {
            trace!(?record, "Captured export record");
            self.records.push(record);
        }
        Ok(())
    }
}

impl ExportVisitor for ModelSession {
    fn visit_start(&mut self) -> SyncResult<()> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Open;
                Ok(())
            }
            SessionState::Open | SessionState::Finished => Err(SyncError::SessionClosed),
        }
    }

    fn visit_end(&mut self) -> SyncResult<()> {
        match self.state {
            SessionState::Open => {
                self.state = SessionState::Finished;
                Ok(())
            }
            SessionState::Idle => Err(SyncError::SessionNotStarted),
            SessionState::Finished => Err(SyncError::SessionClosed),
        }
    }

    fn export_address(&mut self, ea: Address) -> SyncResult<()> {
        self.push(ExportRecord::Address { ea })
    }

    fn export_struct(&mut self, owner: Option<Address>, id: StructId) -> SyncResult<()> {
        self.push(ExportRecord::Struct { id, owner })
    }

    fn delete_struct(&mut self, id: StructId) -> SyncResult<()> {
        self.push(ExportRecord::StructDeleted { id })
    }

    fn export_struct_member(
        &mut self,
        owner: Option<Address>,
        struct_id: StructId,
        offset: u64,
        member: MemberId,
    ) -> SyncResult<()> {
        self.push(ExportRecord::Member {
            struct_id,
            offset,
            id: member,
            owner,
        })
    }

    fn delete_struct_member(
        &mut self,
        owner: Option<Address>,
        struct_id: StructId,
        offset: u64,
    ) -> SyncResult<()> {
        self.push(ExportRecord::MemberDeleted {
            struct_id,
            offset,
            owner,
        })
    }

    fn export_enum(&mut self, id: EnumId) -> SyncResult<()> {
        self.push(ExportRecord::Enum { id })
    }

    fn delete_enum(&mut self, id: EnumId) -> SyncResult<()> {
        self.push(ExportRecord::EnumDeleted { id })
    }

    fn export_segment(&mut self, start: Address, end: Address) -> SyncResult<()> {
        self.push(ExportRecord::Segment { start, end })
    }

    fn export_function(&mut self, ea: Address) -> SyncResult<()> {
        self.push(ExportRecord::Function { ea })
    }
}

/// Pipeline that serializes [`ModelSession`]s into a JSONL cache directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlPipeline;

impl JsonlPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ExportPipeline for JsonlPipeline {
    type Session = ModelSession;

    fn open_session(&self) -> ModelSession {
        ModelSession::new()
    }

    fn serialize(&self, session: ModelSession, target_dir: &Path) -> SyncResult<ExportStats> {
        if !session.is_finished() {
            return Err(SyncError::SessionNotFinished);
        }
        write_cache(&session.records, target_dir)
    }
}

/// Merge `records` into the cache at `cache_dir`.
///
/// # Errors
///
/// Returns an error if an existing cache file is malformed or a write fails.
pub fn write_cache(records: &[ExportRecord], cache_dir: &Path) -> SyncResult<ExportStats> {
    ensure_gitignore(cache_dir)?;

    let now = Utc::now().to_rfc3339();
    let mut stats = ExportStats::default();
    for record in records {
        stats.record(record);
    }

    // Live files: load, apply, write back if changed.
    let mut live: BTreeMap<CacheFile, BTreeMap<RecordKey, CacheLine>> = BTreeMap::new();
    for file in CacheFile::ALL {
        if file == CacheFile::Deletions {
            continue;
        }
        let lines = read_jsonl_or_empty(&cache_dir.join(file.file_name()))?;
        let keyed = lines.into_iter().map(|l| (l.record.key(), l)).collect();
        live.insert(file, keyed);
    }

    let mut deletions = read_jsonl_or_empty(&cache_dir.join(CacheFile::Deletions.file_name()))?;

    for record in records {
        let hash = content_hash(record)?;
        let key = record.key();
        let entries = live.entry(record.live_file()).or_default();

        if record.is_deletion() {
            let was_live = entries.remove(&key).is_some();
            if let RecordKey::Struct(struct_id) = key {
                if let Some(members) = live.get_mut(&CacheFile::Members) {
                    members.retain(|k, _| !matches!(k, RecordKey::Member(s, _) if *s == struct_id));
                }
            }
            // A repeated save of the same pending deletion logs nothing new.
            let logged = deletions
                .iter()
                .any(|line| line.content_hash == hash && line.record.key() == key);
            if !was_live && logged {
                trace!(?key, "Deletion already logged");
                continue;
            }
            deletions.push(CacheLine {
                record: record.clone(),
                content_hash: hash,
                exported_at: now.clone(),
            });
            continue;
        }

        let unchanged = entries
            .get(&key)
            .is_some_and(|existing| !has_changed(&hash, Some(&existing.content_hash)));
        if !unchanged {
            entries.insert(
                key,
                CacheLine {
                    record: record.clone(),
                    content_hash: hash,
                    exported_at: now.clone(),
                },
            );
        }
    }

    for (file, entries) in live {
        let lines: Vec<CacheLine> = entries.into_values().collect();
        if write_if_changed(&cache_dir.join(file.file_name()), &lines)? {
            stats.files_written += 1;
        }
    }
    if write_if_changed(&cache_dir.join(CacheFile::Deletions.file_name()), &deletions)? {
        stats.files_written += 1;
    }

    debug!(
        cache_dir = %cache_dir.display(),
        records = records.len(),
        files_written = stats.files_written,
        "Cache updated"
    );

    Ok(stats)
}

/// Write `lines` unless the file already holds exactly that content.
///
/// An empty, never-created file stays absent.
fn write_if_changed(path: &Path, lines: &[CacheLine]) -> SyncResult<bool> {
    let content = render_jsonl(lines)?;
    let stored = file_hash(path)?;
    if stored.is_none() && lines.is_empty() {
        return Ok(false);
    }
    if !has_changed(&text_hash(&content), stored.as_deref()) {
        return Ok(false);
    }
    atomic_write(path, &content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::file::read_jsonl;
    use tempfile::TempDir;

    fn finished(records: impl FnOnce(&mut ModelSession)) -> ModelSession {
        let mut session = ModelSession::new();
        session.visit_start().unwrap();
        records(&mut session);
        session.visit_end().unwrap();
        session
    }

    #[test]
    fn test_session_rejects_calls_outside_bracket() {
        let mut session = ModelSession::new();
        assert!(matches!(
            session.export_address(Address(1)),
            Err(SyncError::SessionNotStarted)
        ));
        session.visit_start().unwrap();
        session.visit_end().unwrap();
        assert!(matches!(
            session.export_address(Address(1)),
            Err(SyncError::SessionClosed)
        ));
    }

    #[test]
    fn test_session_drops_duplicate_records() {
        let session = finished(|s| {
            s.export_address(Address(1)).unwrap();
            s.export_address(Address(1)).unwrap();
            s.export_address(Address(2)).unwrap();
        });
        assert_eq!(session.records().len(), 2);
    }

    #[test]
    fn test_serialize_requires_finished_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = ModelSession::new();
        session.visit_start().unwrap();

        let result = JsonlPipeline::new().serialize(session, temp_dir.path());
        assert!(matches!(result, Err(SyncError::SessionNotFinished)));
    }

    #[test]
    fn test_serialize_writes_files_per_kind() {
        let temp_dir = TempDir::new().unwrap();
        let session = finished(|s| {
            s.export_address(Address(0x1000)).unwrap();
            s.export_struct(None, StructId(0xff00)).unwrap();
            s.delete_enum(EnumId(0xff20)).unwrap();
        });

        let stats = JsonlPipeline::new()
            .serialize(session, temp_dir.path())
            .unwrap();

        assert_eq!(stats.addresses, 1);
        assert_eq!(stats.structures, 1);
        assert_eq!(stats.deletions, 1);
        assert_eq!(stats.files_written, 3);
        assert!(temp_dir.path().join(".gitignore").exists());
        assert!(temp_dir.path().join("addresses.jsonl").exists());
        assert!(temp_dir.path().join("structures.jsonl").exists());
        assert!(temp_dir.path().join("deletions.jsonl").exists());
        assert!(!temp_dir.path().join("segments.jsonl").exists());
    }

    #[test]
    fn test_struct_deletion_drops_struct_and_members() {
        let temp_dir = TempDir::new().unwrap();
        write_cache(
            &[
                ExportRecord::Struct {
                    id: StructId(7),
                    owner: None,
                },
                ExportRecord::Member {
                    struct_id: StructId(7),
                    offset: 0,
                    id: MemberId(8),
                    owner: None,
                },
                ExportRecord::Member {
                    struct_id: StructId(9),
                    offset: 0,
                    id: MemberId(10),
                    owner: None,
                },
            ],
            temp_dir.path(),
        )
        .unwrap();

        write_cache(&[ExportRecord::StructDeleted { id: StructId(7) }], temp_dir.path()).unwrap();

        assert!(read_jsonl(&temp_dir.path().join("structures.jsonl"))
            .unwrap()
            .is_empty());
        let members = read_jsonl(&temp_dir.path().join("members.jsonl")).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].record.key(), RecordKey::Member(StructId(9), 0));
        let deletions = read_jsonl(&temp_dir.path().join("deletions.jsonl")).unwrap();
        assert_eq!(deletions.len(), 1);
    }

    #[test]
    fn test_unchanged_export_does_not_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let records = [ExportRecord::Address { ea: Address(0x10) }];

        let first = write_cache(&records, temp_dir.path()).unwrap();
        let before = std::fs::read_to_string(temp_dir.path().join("addresses.jsonl")).unwrap();
        let second = write_cache(&records, temp_dir.path()).unwrap();
        let after = std::fs::read_to_string(temp_dir.path().join("addresses.jsonl")).unwrap();

        assert_eq!(first.files_written, 1);
        assert_eq!(second.files_written, 0);
        assert_eq!(before, after);
    }

    #[test]
    fn test_repeated_deletion_is_logged_once() {
        let temp_dir = TempDir::new().unwrap();
        let records = [ExportRecord::StructDeleted { id: StructId(0xff10) }];

        let first = write_cache(&records, temp_dir.path()).unwrap();
        let second = write_cache(&records, temp_dir.path()).unwrap();

        assert_eq!(first.files_written, 1);
        assert_eq!(second.files_written, 0);
        let deletions = read_jsonl(&temp_dir.path().join("deletions.jsonl")).unwrap();
        assert_eq!(deletions.len(), 1);
    }

    #[test]
    fn test_deletion_after_recreation_is_logged_again() {
        let temp_dir = TempDir::new().unwrap();
        let live = [ExportRecord::Enum { id: EnumId(3) }];
        let gone = [ExportRecord::EnumDeleted { id: EnumId(3) }];

        write_cache(&live, temp_dir.path()).unwrap();
        write_cache(&gone, temp_dir.path()).unwrap();
        write_cache(&live, temp_dir.path()).unwrap();
        write_cache(&gone, temp_dir.path()).unwrap();

        let deletions = read_jsonl(&temp_dir.path().join("deletions.jsonl")).unwrap();
        assert_eq!(deletions.len(), 2);
        assert!(read_jsonl(&temp_dir.path().join("enums.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn test_segment_keyed_by_start() {
        let temp_dir = TempDir::new().unwrap();
        write_cache(
            &[ExportRecord::Segment {
                start: Address(0x1000),
                end: Address(0x2000),
            }],
            temp_dir.path(),
        )
        .unwrap();
        write_cache(
            &[ExportRecord::Segment {
                start: Address(0x1000),
                end: Address(0x3000),
            }],
            temp_dir.path(),
        )
        .unwrap();

        let segments = read_jsonl(&temp_dir.path().join("segments.jsonl")).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0].record,
            ExportRecord::Segment {
                start: Address(0x1000),
                end: Address(0x3000),
            }
        );
    }
}
