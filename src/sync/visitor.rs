//! Export visitor and pipeline interfaces.
//!
//! A save pass opens one session from an [`ExportPipeline`], brackets all
//! reconciliation output between `visit_start` and `visit_end`, then hands the
//! finished session back to the pipeline for serialization. Sessions never
//! span two saves.

use std::path::Path;

use crate::model::{Address, EnumId, MemberId, StructId};
use crate::sync::types::{ExportStats, SyncResult};

/// Receiver of reconciled changes.
///
/// `owner` is the function a stack frame belongs to, when the structure being
/// exported is (or was) a frame.
pub trait ExportVisitor {
    fn visit_start(&mut self) -> SyncResult<()>;

    fn visit_end(&mut self) -> SyncResult<()>;

    fn export_address(&mut self, ea: Address) -> SyncResult<()>;

    fn export_struct(&mut self, owner: Option<Address>, id: StructId) -> SyncResult<()>;

    fn delete_struct(&mut self, id: StructId) -> SyncResult<()>;

    fn export_struct_member(
        &mut self,
        owner: Option<Address>,
        struct_id: StructId,
        offset: u64,
        member: MemberId,
    ) -> SyncResult<()>;

    fn delete_struct_member(
        &mut self,
        owner: Option<Address>,
        struct_id: StructId,
        offset: u64,
    ) -> SyncResult<()>;

    fn export_enum(&mut self, id: EnumId) -> SyncResult<()>;

    fn delete_enum(&mut self, id: EnumId) -> SyncResult<()>;

    /// Export a segment. Pipelines may resolve it by `start` alone.
    fn export_segment(&mut self, start: Address, end: Address) -> SyncResult<()>;

    fn export_function(&mut self, ea: Address) -> SyncResult<()>;
}

/// Factory and serializer for export sessions.
pub trait ExportPipeline {
    type Session: ExportVisitor;

    /// Open a fresh, empty session.
    fn open_session(&self) -> Self::Session;

    /// Serialize a finished session into `target_dir`, consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session was not finished or writing fails.
    fn serialize(&self, session: Self::Session, target_dir: &Path) -> SyncResult<ExportStats>;
}
