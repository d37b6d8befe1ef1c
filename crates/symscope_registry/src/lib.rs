//! Scope registry exposing named simulation state to external harnesses.
//!
//! A simulated model registers its scopes and the storage cells behind its
//! externally visible signals in a [`Registry`]. Test benches, waveform
//! dumpers and peek/poke consoles then enumerate scopes, resolve dotted
//! names such as `top.distortion.threshold` and read or write the values
//! in place. The registry borrows the model's storage for its lifetime and
//! never owns or copies it.
//!
//! ```ignore
//! use std::cell::Cell;
//! use symscope_registry::{BitRange, Direction, Registry, ScopeKind, SimContext, StorageKind};
//!
//! let threshold = Cell::new(0u16);
//! let mut reg = Registry::new(&SimContext::default(), "top");
//! let d = reg.configure("distortion", "distortion", -12, ScopeKind::Module)?;
//! reg.insert_variable(d, "threshold", &threshold, false, StorageKind::Word,
//!     Direction::In, &[BitRange::new(15, 0)])?;
//! reg.poke_u64("top.distortion.threshold", 0x1234)?;
//! ```

#![warn(missing_docs)]

pub mod access;
pub mod arena;
pub mod console;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod hierarchy;
pub mod ids;
pub mod layout;
pub mod registry;
pub mod scope;
pub mod storage;
pub mod store;

pub use access::{Peek, Poke};
pub use context::SimContext;
pub use descriptor::{packed_width, BitRange, Direction, StorageKind, VariableDescriptor, VariableSpec};
pub use error::RegistryError;
pub use ids::{ScopeId, VarId};
pub use layout::{Layout, ScopeLayout, VarLayout};
pub use registry::{create_registry, Entry, EntryId, Registry};
pub use scope::{Scope, ScopeKind, ScopeState};
pub use storage::StorageRef;
pub use store::{build_registry, SignalStore};
pub use symscope_common::{BitVector, ContentHash};
