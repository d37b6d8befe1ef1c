//! Opaque ID newtypes for registry entries.
//!
//! Each ID is a thin `u32` wrapper created by
//! [`Arena::alloc`](crate::arena::Arena::alloc). IDs stay valid for the
//! registry's lifetime; after teardown they still resolve, but access through
//! them fails with [`UseAfterTeardown`](crate::RegistryError::UseAfterTeardown).

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Handle to a registered scope.
    ScopeId
);

define_id!(
    /// Handle to a registered variable descriptor.
    VarId
);
