//! Save-time reconciliation.
//!
//! Each pending entity is resolved against the live database: if it still
//! exists it is exported, otherwise its deletion is exported. Stack frames
//! are the special case. A frame that no longer resolves as a structure is
//! still attributed to its function when the function can be found.

use std::collections::BTreeSet;

use tracing::debug;

use super::Hooks;
use crate::database::Database;
use crate::error::Result;
use crate::model::Address;
use crate::storage::Repository;
use crate::sync::ExportVisitor;

/// Note recorded for every comment change when it is saved.
pub(super) const COMMENT_NOTE: &str = "Changed comment";

impl<D, R: Repository, P> Hooks<D, R, P> {
    /// Pending addresses plus pending comments.
    ///
    /// Each comment address is annotated on the way. The dirty set itself is
    /// left as is, so a retried save sees the same input.
    pub(super) fn promote_comments(&mut self) -> Result<BTreeSet<Address>> {
        let mut addresses: BTreeSet<Address> = self.dirty.addresses().collect();
        for ea in self.dirty.comments() {
            self.repository.add_auto_comment(ea.into(), COMMENT_NOTE)?;
            addresses.insert(ea);
        }
        Ok(addresses)
    }
}

impl<D: Database, R, P> Hooks<D, R, P> {
    /// Export or delete every pending structure.
    ///
    /// Returns the functions owning deleted frames. The caller exports them
    /// with the other addresses so each is visited once.
    pub(super) fn reconcile_structures<V: ExportVisitor>(&self, session: &mut V) -> Result<Vec<Address>> {
        let mut owners = Vec::new();
        for id in self.dirty.structures() {
            if self.database.struct_exists(id) {
                session.export_struct(None, id)?;
                continue;
            }

            if let Some(function) = self.database.function_for_frame(id) {
                debug!(struct_id = %id, %function, "Frame attributed to function");
                session.export_struct(Some(function), id)?;
                owners.push(function);
                continue;
            }

            debug!(struct_id = %id, "Structure deleted");
            session.delete_struct(id)?;
        }
        Ok(owners)
    }

    /// Export or delete the pending member of each structure.
    pub(super) fn reconcile_structure_members<V: ExportVisitor>(&self, session: &mut V) -> Result<()> {
        for (struct_id, pending) in self.dirty.structure_members() {
            let offset = pending.offset;
            let mut owner = None;

            if !self.database.struct_exists(struct_id) {
                let Some(function) = self.database.function_for_frame(struct_id) else {
                    session.delete_struct_member(None, struct_id, offset)?;
                    continue;
                };
                session.export_function(function)?;
                owner = Some(function);
            }

            let member = match self.database.member_at(struct_id, offset) {
                Some(member) if member.valid => member,
                _ => {
                    session.delete_struct_member(owner, struct_id, offset)?;
                    continue;
                }
            };

            // A member reaching back over `offset` grew across the pending slot.
            let swallowed = offset
                .checked_sub(1)
                .and_then(|previous| self.database.member_at(struct_id, previous))
                .is_some_and(|previous| previous.id == member.id);
            if swallowed {
                debug!(%struct_id, offset, member = %member.id, "Member swallowed by neighbor");
                session.delete_struct_member(owner, struct_id, offset)?;
                continue;
            }

            session.export_struct_member(owner, struct_id, offset, member.id)?;
        }
        Ok(())
    }

    pub(super) fn reconcile_enums<V: ExportVisitor>(&self, session: &mut V) -> Result<()> {
        for id in self.dirty.enums() {
            if self.database.enum_exists(id) {
                session.export_enum(id)?;
            } else {
                session.delete_enum(id)?;
            }
        }
        Ok(())
    }

    /// Enum constants have no export of their own yet; report what was skipped.
    pub(super) fn reconcile_enum_members(&self) {
        for (member_id, enum_id) in self.dirty.enum_members() {
            debug!(%enum_id, %member_id, "Enum member change not exported");
        }
    }
}
