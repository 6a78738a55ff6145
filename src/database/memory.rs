//! In-memory database snapshot.
//!
//! A `MemoryDatabase` holds just enough of a host database to answer the
//! [`Database`] queries. It can be built in code (tests) or loaded from a JSON
//! snapshot file (the `ct replay` command):
//!
//! ```json
//! {
//!   "path": "/work/target.idb",
//!   "functions": [{"start": 4096, "end": 4352, "frame": 65280}],
//!   "code": [{"start": 8192, "end": 8256}],
//!   "structures": [{"id": 65281, "name": "Point", "members": [
//!     {"id": 65282, "name": "x", "offset": 0, "size": 4}
//!   ]}],
//!   "enums": [{"id": 65300, "name": "Color"}]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Database, MemberRef};
use crate::error::{Error, Result};
use crate::model::{Address, EnumId, MemberId, StructId};

/// A function and, optionally, the structure describing its stack frame.
///
/// The frame link survives deletion of the frame structure itself, which is
/// how the host answers "whose frame was this?" after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub start: Address,
    pub end: Address,
    #[serde(default)]
    pub frame: Option<StructId>,
}

/// A half-open range of addresses classified as code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRange {
    pub start: Address,
    pub end: Address,
}

/// A structure member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDef {
    pub id: MemberId,
    pub name: String,
    pub offset: u64,
    #[serde(default = "default_size")]
    pub size: u64,
    #[serde(default = "default_true")]
    pub valid: bool,
}

fn default_size() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

/// A structure type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDef {
    pub id: StructId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDef>,
}

/// An enum type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub id: EnumId,
    pub name: String,
}

/// Snapshot-backed implementation of [`Database`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDatabase {
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub code: Vec<CodeRange>,
    #[serde(default)]
    pub structures: Vec<StructDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

impl MemoryDatabase {
    /// Create an empty database rooted at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Load a JSON snapshot.
    ///
    /// A snapshot without a `path` adopts the snapshot file's own location so
    /// the cache lands next to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SnapshotNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let mut db: Self = serde_json::from_str(&content)?;
        if db.path.as_os_str().is_empty() {
            db.path = path.to_path_buf();
        }
        Ok(db)
    }

    /// Register a function covering `[start, end)`.
    pub fn add_function(&mut self, start: Address, end: Address, frame: Option<StructId>) {
        self.functions.push(FunctionDef { start, end, frame });
    }

    /// Remove the function starting at `start`.
    pub fn remove_function(&mut self, start: Address) {
        self.functions.retain(|f| f.start != start);
    }

    /// Mark `[start, end)` as code.
    pub fn add_code(&mut self, start: Address, end: Address) {
        self.code.push(CodeRange { start, end });
    }

    /// Register an empty structure.
    pub fn add_struct(&mut self, id: StructId, name: &str) {
        self.structures.push(StructDef {
            id,
            name: name.to_string(),
            members: Vec::new(),
        });
    }

    /// Delete a structure. Frame links held by functions are kept.
    pub fn remove_struct(&mut self, id: StructId) {
        self.structures.retain(|s| s.id != id);
    }

    /// Add a member to an existing structure. Unknown structures are ignored.
    pub fn add_member(&mut self, struct_id: StructId, id: MemberId, name: &str, offset: u64, size: u64) {
        if let Some(def) = self.structures.iter_mut().find(|s| s.id == struct_id) {
            def.members.push(MemberDef {
                id,
                name: name.to_string(),
                offset,
                size: size.max(1),
                valid: true,
            });
        }
    }

    /// Remove a member from a structure.
    pub fn remove_member(&mut self, struct_id: StructId, id: MemberId) {
        if let Some(def) = self.structures.iter_mut().find(|s| s.id == struct_id) {
            def.members.retain(|m| m.id != id);
        }
    }

    /// Resize a member in place, e.g. to let it grow over a neighbor.
    pub fn resize_member(&mut self, struct_id: StructId, id: MemberId, size: u64) {
        if let Some(member) = self
            .structures
            .iter_mut()
            .find(|s| s.id == struct_id)
            .and_then(|s| s.members.iter_mut().find(|m| m.id == id))
        {
            member.size = size.max(1);
        }
    }

    /// Flag a member as invalid without removing its slot.
    pub fn invalidate_member(&mut self, struct_id: StructId, id: MemberId) {
        if let Some(member) = self
            .structures
            .iter_mut()
            .find(|s| s.id == struct_id)
            .and_then(|s| s.members.iter_mut().find(|m| m.id == id))
        {
            member.valid = false;
        }
    }

    /// Register an enum.
    pub fn add_enum(&mut self, id: EnumId, name: &str) {
        self.enums.push(EnumDef {
            id,
            name: name.to_string(),
        });
    }

    /// Delete an enum.
    pub fn remove_enum(&mut self, id: EnumId) {
        self.enums.retain(|e| e.id != id);
    }

    fn find_struct(&self, id: StructId) -> Option<&StructDef> {
        self.structures.iter().find(|s| s.id == id)
    }
}

impl Database for MemoryDatabase {
    fn struct_exists(&self, id: StructId) -> bool {
        self.find_struct(id).is_some()
    }

    fn function_for_frame(&self, id: StructId) -> Option<Address> {
        self.functions
            .iter()
            .find(|f| f.frame == Some(id))
            .map(|f| f.start)
    }

    fn member_at(&self, id: StructId, offset: u64) -> Option<MemberRef> {
        self.find_struct(id)?
            .members
            .iter()
            .find(|m| m.offset <= offset && offset < m.offset.saturating_add(m.size))
            .map(|m| MemberRef {
                id: m.id,
                valid: m.valid,
            })
    }

    fn member_fullname(&self, id: MemberId) -> Option<String> {
        self.structures.iter().find_map(|s| {
            s.members
                .iter()
                .find(|m| m.id == id)
                .map(|m| format!("{}.{}", s.name, m.name))
        })
    }

    fn enum_exists(&self, id: EnumId) -> bool {
        self.enums.iter().any(|e| e.id == id)
    }

    fn is_in_function(&self, ea: Address) -> bool {
        self.functions.iter().any(|f| f.start <= ea && ea < f.end)
    }

    fn is_code(&self, ea: Address) -> bool {
        self.code.iter().any(|r| r.start <= ea && ea < r.end)
    }

    fn is_member_id(&self, ea: Address) -> bool {
        self.structures
            .iter()
            .flat_map(|s| s.members.iter())
            .any(|m| m.id.get() == ea.get())
    }

    fn database_path(&self) -> PathBuf {
        self.path.clone()
    }
}
