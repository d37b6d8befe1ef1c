//! Parsing and validation of `symscope.toml` model layout files.
//!
//! A layout file declares the instance name, timescale, scopes and variables
//! of a simulated model, so a harness can build a symbol registry for a model
//! without hand-written binding code. The loader produces a strongly-typed
//! [`LayoutConfig`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod timescale;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_layout, load_layout_from_str, LAYOUT_FILE_NAME};
pub use timescale::{format_timescale, parse_timescale};
pub use types::*;
