//! Shared foundational types used across the symscope crates.
//!
//! This crate provides interned identifiers for qualified names, content
//! hashing for layout fingerprints, and the 2-state [`BitVector`] value type
//! used to read and write simulation state of any width.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod value;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use value::{BitVector, ParseValueError, MAX_WIDTH};
