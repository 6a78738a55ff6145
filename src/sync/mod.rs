//! Export pipeline and JSONL cache.
//!
//! - **Visitor**: the interface reconciliation drives during a save
//! - **Export**: default pipeline that merges a save into the cache
//! - **Hashing**: SHA256 content hashing for change detection
//! - **Status**: cache file listing
//!
//! # File Format
//!
//! Each cache file holds one record per line with a `type` tag:
//! ```json
//! {"type":"member","struct_id":65280,"offset":8,"id":65283,"owner":4096,"content_hash":"ab12…","exported_at":"2026-10-17T10:00:00Z"}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ct::sync::{ExportPipeline, ExportVisitor, JsonlPipeline};
//!
//! let pipeline = JsonlPipeline::new();
//! let mut session = pipeline.open_session();
//! session.visit_start()?;
//! session.export_address(Address(0x401000))?;
//! session.visit_end()?;
//! let stats = pipeline.serialize(session, &cache_dir)?;
//! ```

mod export;
mod file;
mod hash;
pub mod status;
mod types;
mod visitor;

pub use export::{JsonlPipeline, ModelSession, write_cache};
pub use file::{
    atomic_write, count_lines, ensure_gitignore, file_size, gitignore_content, read_jsonl,
};
pub use hash::{content_hash, has_changed};
pub use status::{cache_status, print_status};
pub use types::{
    CacheFile, CacheFileInfo, CacheLine, CacheStatus, ExportRecord, ExportStats, RecordKey,
    SyncError, SyncResult,
};
pub use visitor::{ExportPipeline, ExportVisitor};
