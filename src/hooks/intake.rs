//! Notification intake.
//!
//! One method per host mutation. Each records the entity in the dirty set and
//! forwards a note to the repository right away, because the context in the
//! note (old name, offset, member name) is gone by the time a save runs. The
//! dirty entry is recorded before the note is forwarded, so a repository
//! failure never loses the pending change.

use tracing::{debug, warn};

use super::Hooks;
use super::dirty::PendingMember;
use crate::database::Database;
use crate::error::Result;
use crate::model::ids::hex;
use crate::model::{Address, EnumId, EnumMemberId, MemberId, Notification, StructId};
use crate::storage::Repository;

/// Build the note for a rename.
///
/// `"<type> renamed from <old> to <new>"`; the type and the `from` clause are
/// dropped when empty.
#[must_use]
pub fn rename_message(type_label: &str, old_name: &str, new_name: &str) -> String {
    let mut message = String::new();
    if !type_label.is_empty() {
        message.push_str(type_label);
        message.push(' ');
    }
    message.push_str("renamed ");
    if !old_name.is_empty() {
        message.push_str("from ");
        message.push_str(old_name);
        message.push(' ');
    }
    message.push_str("to ");
    message.push_str(new_name);
    message
}

impl<D: Database, R: Repository, P> Hooks<D, R, P> {
    /// Dispatch a serialized notification to the matching intake method.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn notify(&mut self, notification: Notification) -> Result<()> {
        match notification {
            Notification::Rename {
                ea,
                type_label,
                old_name,
                new_name,
            } => self.rename(ea, &type_label, &old_name, &new_name),
            Notification::CommentChanged { ea } => {
                self.comment_changed(ea);
                Ok(())
            }
            Notification::Undefine { ea } => self.undefine(ea),
            Notification::FunctionDeleted { ea } => self.function_deleted(ea),
            Notification::CodeCreated { ea } => self.code_created(ea),
            Notification::DataCreated { ea } => self.data_created(ea),
            Notification::FunctionCreated { ea } => self.function_created(ea),
            Notification::StructureUpdated { struct_id } => self.structure_updated(struct_id),
            Notification::StructureMemberUpdated {
                struct_id,
                member_id,
                offset,
            } => self.structure_member_updated(struct_id, member_id, offset),
            Notification::StructureMemberDeleted {
                struct_id,
                member_id,
                offset,
            } => self.structure_member_deleted(struct_id, member_id, offset),
            Notification::EnumUpdated { enum_id } => self.enum_updated(enum_id),
            Notification::EnumMemberUpdated { enum_id, member_id } => {
                self.enum_member_updated(enum_id, member_id)
            }
            Notification::OperandTypeChanged { ea } => self.operand_type_changed(ea),
            Notification::SegmentAdded { start, end } => {
                self.segment_added(start, end);
                Ok(())
            }
            Notification::TypeInfoChanged { ea } => self.type_info_changed(ea),
        }
    }

    /// An address was renamed.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn rename(&mut self, ea: Address, type_label: &str, old_name: &str, new_name: &str) -> Result<()> {
        let message = rename_message(type_label, old_name, new_name);
        self.add_address(ea, &message)
    }

    /// A comment changed at `ea`. Annotated at save time.
    pub fn comment_changed(&mut self, ea: Address) {
        debug!(%ea, "Comment changed");
        self.dirty.mark_comment(ea);
    }

    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn undefine(&mut self, ea: Address) -> Result<()> {
        self.add_address(ea, "Undefine")
    }

    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn function_deleted(&mut self, ea: Address) -> Result<()> {
        self.add_address(ea, "Delete function")
    }

    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn code_created(&mut self, ea: Address) -> Result<()> {
        self.add_address(ea, "Create code")
    }

    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn data_created(&mut self, ea: Address) -> Result<()> {
        self.add_address(ea, "Create data")
    }

    /// A function was created at `ea`.
    ///
    /// Only the entry address is marked. Objects inside the new function's
    /// range that were exported as loose code are not revisited.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn function_created(&mut self, ea: Address) -> Result<()> {
        self.add_address(ea, "Create function")
    }

    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn type_info_changed(&mut self, ea: Address) -> Result<()> {
        self.add_address(ea, "Type information changed")
    }

    /// A structure (or stack frame) changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn structure_updated(&mut self, struct_id: StructId) -> Result<()> {
        debug!(%struct_id, "Structure updated");
        self.dirty.mark_structure(struct_id);
        self.repository.add_auto_comment(struct_id.into(), "Updated")
    }

    /// A member of `struct_id` at `offset` changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn structure_member_updated(&mut self, struct_id: StructId, member_id: MemberId, offset: u64) -> Result<()> {
        let fullname = self
            .database
            .member_fullname(member_id)
            .unwrap_or_else(|| member_id.to_string());
        let message = format!("Member updated at offset {} : {fullname}", hex(offset));
        self.add_structure_member(struct_id, member_id, offset, &message)
    }

    /// A member of `struct_id` at `offset` was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn structure_member_deleted(&mut self, struct_id: StructId, member_id: MemberId, offset: u64) -> Result<()> {
        self.add_structure_member(struct_id, member_id, offset, "Member deleted")
    }

    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn enum_updated(&mut self, enum_id: EnumId) -> Result<()> {
        debug!(%enum_id, "Enum updated");
        self.dirty.mark_enum(enum_id);
        self.repository.add_auto_comment(enum_id.into(), "Updated")
    }

    /// An enum constant changed. Recorded and annotated, never exported.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn enum_member_updated(&mut self, enum_id: EnumId, member_id: EnumMemberId) -> Result<()> {
        debug!(%enum_id, %member_id, "Enum member updated");
        self.dirty.mark_enum_member(enum_id, member_id);
        self.repository.add_auto_comment(enum_id.into(), "Member updated")
    }

    /// An operand type changed at `ea`.
    ///
    /// Code in a function is tracked like any address change. A structure
    /// member id is already covered by the member notifications. Anything
    /// else (code outside a function) is unsupported and only logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository rejects the annotation.
    pub fn operand_type_changed(&mut self, ea: Address) -> Result<()> {
        if self.database.is_in_function(ea) || self.database.is_code(ea) {
            return self.add_address(ea, "Operand type change");
        }

        if self.database.is_member_id(ea) {
            return Ok(());
        }

        warn!(%ea, "Operand type changed on code outside of a function: not supported");
        Ok(())
    }

    /// A segment covering `[start, end)` was added.
    pub fn segment_added(&mut self, start: Address, end: Address) {
        debug!(%start, %end, "Segment added");
        self.dirty.mark_segment(start, end);
    }

    fn add_address(&mut self, ea: Address, message: &str) -> Result<()> {
        debug!(%ea, note = message, "Address marked");
        self.dirty.mark_address(ea, message);
        self.repository.add_auto_comment(ea.into(), message)
    }

    fn add_structure_member(
        &mut self,
        struct_id: StructId,
        member_id: MemberId,
        offset: u64,
        message: &str,
    ) -> Result<()> {
        let replaced = self
            .dirty
            .mark_structure_member(struct_id, PendingMember { member_id, offset });
        if let Some(previous) = replaced.filter(|p| p.member_id != member_id || p.offset != offset) {
            debug!(
                %struct_id,
                dropped_member = %previous.member_id,
                dropped_offset = previous.offset,
                "Pending member change replaced"
            );
        }
        self.repository.add_auto_comment(struct_id.into(), message)
    }
}
