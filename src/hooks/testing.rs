//! Test doubles for the tracker's collaborators.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::Hooks;
use crate::database::MemoryDatabase;
use crate::error::{Error, Result};
use crate::model::{Address, EntityId, EnumId, MemberId, StructId};
use crate::storage::{Repository, SqliteRepository};
use crate::sync::{ExportPipeline, ExportRecord, ExportStats, ExportVisitor, SyncError, SyncResult};

/// Session that logs every visitor call, duplicates included.
#[derive(Debug, Default)]
pub struct Recorder {
    started: bool,
    ended: bool,
    records: Vec<ExportRecord>,
}

impl Recorder {
    fn push(&mut self, record: ExportRecord) -> SyncResult<()> {
        if !self.started {
            return Err(SyncError::SessionNotStarted);
        }
        if self.ended {
            return Err(SyncError::SessionClosed);
        }
        self.records.push(record);
        Ok(())
    }
}

impl ExportVisitor for Recorder {
    fn visit_start(&mut self) -> SyncResult<()> {
        self.started = true;
        Ok(())
    }

    fn visit_end(&mut self) -> SyncResult<()> {
        self.ended = true;
        Ok(())
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

    fn delete_struct_member(&mut self, owner: Option<Address>, struct_id: StructId, offset: u64) -> SyncResult<()> {
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

/// One serialized save.
#[derive(Debug, Clone)]
pub struct Saved {
    pub records: Vec<ExportRecord>,
    pub target: PathBuf,
}

/// Pipeline that keeps every finished session in memory.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    pub fail_serialize: bool,
    saves: RefCell<Vec<Saved>>,
}

impl RecordingPipeline {
    /// Records of the most recent successful save.
    pub fn last(&self) -> Vec<ExportRecord> {
        self.saves
            .borrow()
            .last()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    pub fn last_target(&self) -> Option<PathBuf> {
        self.saves.borrow().last().map(|s| s.target.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.borrow().len()
    }
}

impl ExportPipeline for RecordingPipeline {
    type Session = Recorder;

    fn open_session(&self) -> Recorder {
        Recorder::default()
    }

    fn serialize(&self, session: Recorder, target_dir: &Path) -> SyncResult<ExportStats> {
        if !session.ended {
            return Err(SyncError::SessionNotFinished);
        }
        if self.fail_serialize {
            return Err(SyncError::Pipeline("disk full".to_string()));
        }
        let mut stats = ExportStats::default();
        for record in &session.records {
            stats.record(record);
        }
        self.saves.borrow_mut().push(Saved {
            records: session.records,
            target: target_dir.to_path_buf(),
        });
        Ok(stats)
    }
}

/// Repository that rejects every note.
#[derive(Debug, Default)]
pub struct FailingRepository;

impl Repository for FailingRepository {
    fn add_auto_comment(&mut self, entity: EntityId, _message: &str) -> Result<()> {
        Err(Error::Other(format!("repository unavailable for {entity}")))
    }
}

/// Tracker over `db` with an in-memory annotation store and a recording pipeline.
pub fn tracker(db: MemoryDatabase) -> Hooks<MemoryDatabase, SqliteRepository, RecordingPipeline> {
    Hooks::new(
        db,
        SqliteRepository::open_memory().unwrap(),
        RecordingPipeline::default(),
    )
}
