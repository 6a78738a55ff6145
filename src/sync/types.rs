//! Record types for the JSONL cache.
//!
//! Every export visitor call becomes one [`ExportRecord`]. On disk each record
//! is wrapped in a [`CacheLine`] carrying sync metadata, and lives in the file
//! for its kind (`addresses.jsonl`, `structures.jsonl`, ...).

use serde::{Deserialize, Serialize};

use crate::model::{Address, EnumId, MemberId, StructId};

/// Tagged union for exported changes.
///
/// The serde tag attribute makes each JSON line look like:
/// `{"type":"struct","id":65280,"owner":4096,...}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportRecord {
    /// An address whose contents must be re-exported.
    Address { ea: Address },
    /// A structure or stack frame that was modified.
    Struct {
        id: StructId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<Address>,
    },
    /// A standalone structure that no longer exists.
    StructDeleted { id: StructId },
    /// A structure member that was modified.
    Member {
        struct_id: StructId,
        offset: u64,
        id: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<Address>,
    },
    /// A structure member that no longer exists at its offset.
    MemberDeleted {
        struct_id: StructId,
        offset: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<Address>,
    },
    /// An enum that was modified.
    Enum { id: EnumId },
    /// An enum that no longer exists.
    EnumDeleted { id: EnumId },
    /// A segment, identified by its start address.
    Segment { start: Address, end: Address },
    /// A whole function, exported because its frame changed.
    Function { ea: Address },
}

/// Cache file a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheFile {
    Addresses,
    Structures,
    Members,
    Enums,
    Segments,
    Functions,
    Deletions,
}

impl CacheFile {
    /// Every cache file, in write order.
    pub const ALL: [Self; 7] = [
        Self::Addresses,
        Self::Structures,
        Self::Members,
        Self::Enums,
        Self::Segments,
        Self::Functions,
        Self::Deletions,
    ];

    /// File name inside the cache directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Addresses => "addresses.jsonl",
            Self::Structures => "structures.jsonl",
            Self::Members => "members.jsonl",
            Self::Enums => "enums.jsonl",
            Self::Segments => "segments.jsonl",
            Self::Functions => "functions.jsonl",
            Self::Deletions => "deletions.jsonl",
        }
    }
}

/// Identity of a cached entity; an upsert replaces the line with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Address(Address),
    Struct(StructId),
    Member(StructId, u64),
    Enum(EnumId),
    Segment(Address),
    Function(Address),
}

impl ExportRecord {
    /// Whether this record removes an entity rather than updating it.
    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        matches!(
            self,
            Self::StructDeleted { .. } | Self::MemberDeleted { .. } | Self::EnumDeleted { .. }
        )
    }

    /// The file holding the live version of the entity this record touches.
    #[must_use]
    pub const fn live_file(&self) -> CacheFile {
        match self {
            Self::Address { .. } => CacheFile::Addresses,
            Self::Struct { .. } | Self::StructDeleted { .. } => CacheFile::Structures,
            Self::Member { .. } | Self::MemberDeleted { .. } => CacheFile::Members,
            Self::Enum { .. } | Self::EnumDeleted { .. } => CacheFile::Enums,
            Self::Segment { .. } => CacheFile::Segments,
            Self::Function { .. } => CacheFile::Functions,
        }
    }

    /// Key of the entity this record touches.
    ///
    /// Segments are keyed by their start address only; a segment whose end
    /// moved replaces the previous line for the same start.
    #[must_use]
    pub const fn key(&self) -> RecordKey {
        match self {
            Self::Address { ea } => RecordKey::Address(*ea),
            Self::Struct { id, .. } | Self::StructDeleted { id } => RecordKey::Struct(*id),
            Self::Member {
                struct_id, offset, ..
            }
            | Self::MemberDeleted {
                struct_id, offset, ..
            } => RecordKey::Member(*struct_id, *offset),
            Self::Enum { id } | Self::EnumDeleted { id } => RecordKey::Enum(*id),
            Self::Segment { start, .. } => RecordKey::Segment(*start),
            Self::Function { ea } => RecordKey::Function(*ea),
        }
    }
}

/// One line of a cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheLine {
    /// The exported change.
    #[serde(flatten)]
    pub record: ExportRecord,
    /// SHA256 hash of the serialized record (for change detection).
    pub content_hash: String,
    /// ISO8601 timestamp when this record was exported.
    pub exported_at: String,
}

/// Statistics for one save pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Addresses exported.
    pub addresses: usize,
    /// Structures and frames exported.
    pub structures: usize,
    /// Structure members exported.
    pub members: usize,
    /// Enums exported.
    pub enums: usize,
    /// Segments exported.
    pub segments: usize,
    /// Functions exported on behalf of their frames.
    pub functions: usize,
    /// Deletions exported (structures, members, enums).
    pub deletions: usize,
    /// Cache files rewritten because their content changed.
    pub files_written: usize,
}

impl ExportStats {
    /// Count one record.
    pub fn record(&mut self, record: &ExportRecord) {
        match record {
            ExportRecord::Address { .. } => self.addresses += 1,
            ExportRecord::Struct { .. } => self.structures += 1,
            ExportRecord::Member { .. } => self.members += 1,
            ExportRecord::Enum { .. } => self.enums += 1,
            ExportRecord::Segment { .. } => self.segments += 1,
            ExportRecord::Function { .. } => self.functions += 1,
            ExportRecord::StructDeleted { .. }
            | ExportRecord::MemberDeleted { .. }
            | ExportRecord::EnumDeleted { .. } => self.deletions += 1,
        }
    }

    /// Total number of updates (excludes deletions).
    #[must_use]
    pub fn total(&self) -> usize {
        self.addresses + self.structures + self.members + self.enums + self.segments + self.functions
    }

    /// Total including deletions.
    #[must_use]
    pub fn total_with_deletions(&self) -> usize {
        self.total() + self.deletions
    }

    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_with_deletions() == 0
    }
}

/// Information about a cache file.
#[derive(Debug, Clone, Serialize)]
pub struct CacheFileInfo {
    /// File name (e.g., "addresses.jsonl").
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Number of lines (records) in the file.
    pub line_count: usize,
}

/// Snapshot of the cache directory.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    /// The cache directory inspected.
    pub cache_dir: String,
    /// Whether the directory exists.
    pub exists: bool,
    /// Files present, in canonical order.
    pub files: Vec<CacheFileInfo>,
}

/// Export-pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A visitor call arrived before `visit_start`.
    #[error("Export session not started")]
    SessionNotStarted,

    /// A visitor call arrived after `visit_end`.
    #[error("Export session already closed")]
    SessionClosed,

    /// Serialization was requested before `visit_end`.
    #[error("Export session not finished")]
    SessionNotFinished,

    /// Cache file not found.
    #[error("Cache file not found: {0}")]
    FileNotFound(String),

    /// Invalid cache line.
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord {
        /// Line number (1-indexed).
        line: usize,
        /// Error message.
        message: String,
    },

    /// Failure reported by an external pipeline.
    #[error("Export pipeline error: {0}")]
    Pipeline(String),
}

/// Result type for export operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_stats() {
        let mut stats = ExportStats::default();
        assert!(stats.is_empty());

        stats.record(&ExportRecord::Address { ea: Address(1) });
        stats.record(&ExportRecord::EnumDeleted { id: EnumId(2) });
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.total_with_deletions(), 2);
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_deletion_shares_key_with_update() {
        let update = ExportRecord::Member {
            struct_id: StructId(1),
            offset: 8,
            id: MemberId(3),
            owner: None,
        };
        let delete = ExportRecord::MemberDeleted {
            struct_id: StructId(1),
            offset: 8,
            owner: Some(Address(0x1000)),
        };
        assert_eq!(update.key(), delete.key());
        assert_eq!(update.live_file(), delete.live_file());
        assert!(delete.is_deletion());
        assert!(!update.is_deletion());
    }

    #[test]
    fn test_cache_line_json_shape() {
        let line = CacheLine {
            record: ExportRecord::Struct {
                id: StructId(255),
                owner: None,
            },
            content_hash: "abc".to_string(),
            exported_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&line).unwrap();
        assert!(json.contains(r#""type":"struct""#));
        assert!(!json.contains("owner"));

        let back: CacheLine = serde_json::from_str(&json).unwrap();
        assert_eq!(back.record, line.record);
    }
}
