//! Read-only view of the live analysis database.
//!
//! Reconciliation never trusts what it was told at notification time; it asks
//! the database for current truth through the [`Database`] capability. The
//! trait only exposes queries, so a save pass cannot mutate the host.
//!
//! Absence is data here, not failure: a structure that no longer resolves is
//! how reconciliation learns it was deleted.
//!
//! # Submodules
//!
//! - [`memory`] - In-memory snapshot implementation used by tests and replay

pub mod memory;

use std::path::PathBuf;

use crate::model::{Address, EnumId, MemberId, StructId};

pub use memory::{CodeRange, EnumDef, FunctionDef, MemberDef, MemoryDatabase, StructDef};

/// The member currently occupying a structure offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef {
    /// Identifier of the member.
    pub id: MemberId,
    /// False when the host still reports a slot but flags it as unusable.
    pub valid: bool,
}

/// Query capability over the host database.
pub trait Database {
    /// Whether a live structure (or stack frame) is registered under `id`.
    fn struct_exists(&self, id: StructId) -> bool;

    /// The function whose stack frame is (or was) the structure `id`.
    fn function_for_frame(&self, id: StructId) -> Option<Address>;

    /// The member covering `offset` in structure `id`.
    ///
    /// Returns `None` when the structure is gone or the offset is a hole.
    fn member_at(&self, id: StructId, offset: u64) -> Option<MemberRef>;

    /// Fully qualified member name, e.g. `Point.x`.
    fn member_fullname(&self, id: MemberId) -> Option<String>;

    /// Whether a live enum is registered under `id`.
    fn enum_exists(&self, id: EnumId) -> bool;

    /// Whether `ea` lies inside any function.
    fn is_in_function(&self, ea: Address) -> bool;

    /// Whether `ea` is classified as executable code.
    fn is_code(&self, ea: Address) -> bool;

    /// Whether `ea` is the identifier of a structure member.
    fn is_member_id(&self, ea: Address) -> bool;

    /// Path of the primary database file of the current session.
    fn database_path(&self) -> PathBuf;
}
