//! Typed identifiers.
//!
//! The host database keys every entity by a 64-bit value taken from one shared
//! address space: code addresses, structure ids, member ids and enum ids never
//! collide. Each kind still gets its own newtype so reconciliation code cannot
//! pass a member id where a structure id is expected. All of them convert into
//! [`EntityId`], which is what the repository annotates.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw 64-bit value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for EntityId {
            fn from(value: $name) -> Self {
                Self(value.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

/// Key used to attach annotations in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = String;

    /// Accepts `0x`-prefixed hex or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(Self)
            .map_err(|e| format!("Invalid entity id '{s}': {e}"))
    }
}

id_type!(
    /// A location in the analyzed binary's address space.
    Address
);
id_type!(
    /// Identifier of a structure type, including function stack frames.
    StructId
);
id_type!(
    /// Identifier of a structure member.
    MemberId
);
id_type!(
    /// Identifier of an enum type.
    EnumId
);
id_type!(
    /// Identifier of an enum constant.
    EnumMemberId
);

/// Format a byte offset the way the host prints addresses.
#[must_use]
pub fn hex(value: u64) -> String {
    format!("{value:#x}")
}
