//! Domain types shared by the tracker.
//!
//! - [`ids`] - Typed identifiers for addresses, structures, members and enums
//! - [`notification`] - Serializable form of every host mutation notification

pub mod ids;
pub mod notification;

pub use ids::{Address, EntityId, EnumId, EnumMemberId, MemberId, StructId};
pub use notification::Notification;
