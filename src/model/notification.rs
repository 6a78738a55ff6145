//! Serializable host notifications.
//!
//! Each variant mirrors one intake operation on [`crate::hooks::Hooks`].
//! Notification logs are stored as JSONL, one tagged object per line:
//! `{"kind":"rename","ea":4198400,"type_label":"function","old_name":"sub_401000","new_name":"main"}`

use serde::{Deserialize, Serialize};

use super::ids::{Address, EnumId, EnumMemberId, MemberId, StructId};

/// A mutation notification emitted by the host database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Rename {
        ea: Address,
        #[serde(default)]
        type_label: String,
        #[serde(default)]
        old_name: String,
        new_name: String,
    },
    CommentChanged {
        ea: Address,
    },
    Undefine {
        ea: Address,
    },
    FunctionDeleted {
        ea: Address,
    },
    CodeCreated {
        ea: Address,
    },
    DataCreated {
        ea: Address,
    },
    FunctionCreated {
        ea: Address,
    },
    StructureUpdated {
        struct_id: StructId,
    },
    StructureMemberUpdated {
        struct_id: StructId,
        member_id: MemberId,
        offset: u64,
    },
    StructureMemberDeleted {
        struct_id: StructId,
        member_id: MemberId,
        offset: u64,
    },
    EnumUpdated {
        enum_id: EnumId,
    },
    EnumMemberUpdated {
        enum_id: EnumId,
        member_id: EnumMemberId,
    },
    OperandTypeChanged {
        ea: Address,
    },
    SegmentAdded {
        start: Address,
        end: Address,
    },
    TypeInfoChanged {
        ea: Address,
    },
}

impl Notification {
    /// Stable snake_case name of the notification kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Rename { .. } => "rename",
            Self::CommentChanged { .. } => "comment_changed",
            Self::Undefine { .. } => "undefine",
            Self::FunctionDeleted { .. } => "function_deleted",
            Self::CodeCreated { .. } => "code_created",
            Self::DataCreated { .. } => "data_created",
            Self::FunctionCreated { .. } => "function_created",
            Self::StructureUpdated { .. } => "structure_updated",
            Self::StructureMemberUpdated { .. } => "structure_member_updated",
            Self::StructureMemberDeleted { .. } => "structure_member_deleted",
            Self::EnumUpdated { .. } => "enum_updated",
            Self::EnumMemberUpdated { .. } => "enum_member_updated",
            Self::OperandTypeChanged { .. } => "operand_type_changed",
            Self::SegmentAdded { .. } => "segment_added",
            Self::TypeInfoChanged { .. } => "type_info_changed",
        }
    }
}
