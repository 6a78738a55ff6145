//! Pending-change collections.
//!
//! The dirty set only records *that* something may have changed. Whether it
//! was modified or deleted is decided at save time against the live database.
//! Every collection deduplicates by key, so a burst of notifications for the
//! same entity collapses into one pending entry per cycle.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Address, EnumId, EnumMemberId, MemberId, StructId};

/// The member last reported for a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMember {
    pub member_id: MemberId,
    pub offset: u64,
}

/// Everything waiting for the next save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    /// Address → latest notify-time message.
    addresses: BTreeMap<Address, String>,
    structures: BTreeSet<StructId>,
    /// One slot per structure: a second member change overwrites the first.
    structure_members: BTreeMap<StructId, PendingMember>,
    enums: BTreeSet<EnumId>,
    /// Recorded but never exported; see `Hooks::reconcile_enum_members`.
    enum_members: BTreeMap<EnumMemberId, EnumId>,
    comments: BTreeSet<Address>,
    segments: BTreeSet<(Address, Address)>,
}

/// Number of pending entries per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingCounts {
    pub addresses: usize,
    pub structures: usize,
    pub structure_members: usize,
    pub enums: usize,
    pub enum_members: usize,
    pub comments: usize,
    pub segments: usize,
}

impl PendingCounts {
    /// Sum over all collections.
    #[must_use]
    pub fn total(&self) -> usize {
        self.addresses
            + self.structures
            + self.structure_members
            + self.enums
            + self.enum_members
            + self.comments
            + self.segments
    }
}

impl DirtySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an address; a later message replaces the earlier one.
    pub fn mark_address(&mut self, ea: Address, message: &str) {
        self.addresses.insert(ea, message.to_string());
    }

    pub fn mark_structure(&mut self, id: StructId) {
        self.structures.insert(id);
    }

    /// Record the latest member change for a structure.
    ///
    /// Returns the pending member this call replaced, if any.
    pub fn mark_structure_member(&mut self, struct_id: StructId, pending: PendingMember) -> Option<PendingMember> {
        self.structure_members.insert(struct_id, pending)
    }

    pub fn mark_enum(&mut self, id: EnumId) {
        self.enums.insert(id);
    }

    pub fn mark_enum_member(&mut self, enum_id: EnumId, member_id: EnumMemberId) {
        self.enum_members.insert(member_id, enum_id);
    }

    pub fn mark_comment(&mut self, ea: Address) {
        self.comments.insert(ea);
    }

    pub fn mark_segment(&mut self, start: Address, end: Address) {
        self.segments.insert((start, end));
    }

    /// Pending addresses, ascending.
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.addresses.keys().copied()
    }

    /// Latest message recorded for `ea`.
    #[must_use]
    pub fn address_message(&self, ea: Address) -> Option<&str> {
        self.addresses.get(&ea).map(String::as_str)
    }

    pub fn structures(&self) -> impl Iterator<Item = StructId> + '_ {
        self.structures.iter().copied()
    }

    pub fn structure_members(&self) -> impl Iterator<Item = (StructId, PendingMember)> + '_ {
        self.structure_members.iter().map(|(id, pending)| (*id, *pending))
    }

    pub fn enums(&self) -> impl Iterator<Item = EnumId> + '_ {
        self.enums.iter().copied()
    }

    pub fn enum_members(&self) -> impl Iterator<Item = (EnumMemberId, EnumId)> + '_ {
        self.enum_members.iter().map(|(member, owner)| (*member, *owner))
    }

    pub fn comments(&self) -> impl Iterator<Item = Address> + '_ {
        self.comments.iter().copied()
    }

    pub fn segments(&self) -> impl Iterator<Item = (Address, Address)> + '_ {
        self.segments.iter().copied()
    }

    #[must_use]
    pub fn contains_address(&self, ea: Address) -> bool {
        self.addresses.contains_key(&ea)
    }

    #[must_use]
    pub fn contains_comment(&self, ea: Address) -> bool {
        self.comments.contains(&ea)
    }

    #[must_use]
    pub fn pending_member(&self, struct_id: StructId) -> Option<PendingMember> {
        self.structure_members.get(&struct_id).copied()
    }

    #[must_use]
    pub fn counts(&self) -> PendingCounts {
        PendingCounts {
            addresses: self.addresses.len(),
            structures: self.structures.len(),
            structure_members: self.structure_members.len(),
            enums: self.enums.len(),
            enum_members: self.enum_members.len(),
            comments: self.comments.len(),
            segments: self.segments.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.addresses.clear();
        self.structures.clear();
        self.structure_members.clear();
        self.enums.clear();
        self.enum_members.clear();
        self.comments.clear();
        self.segments.clear();
    }
}
