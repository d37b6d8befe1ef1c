//! The explicit simulation context passed into registry construction.
//!
//! Generated binding code traditionally reaches for a process-wide context
//! to record the model's timescale. Here the context is an ordinary value
//! the caller owns and lends to [`Registry::new`](crate::Registry::new).

use std::fmt;

use serde::{Deserialize, Serialize};
use symscope_config::{format_timescale, parse_timescale, ModelMeta};

use crate::error::RegistryError;

/// Finest exponent accepted (1 fs).
pub const MIN_EXPONENT: i8 = -15;
/// Coarsest exponent accepted (100 s).
pub const MAX_EXPONENT: i8 = 2;

/// Timescale of a simulated model, as base-10 exponents of seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimContext {
    time_unit: i8,
    time_precision: i8,
}

impl SimContext {
    /// Creates a context after checking both exponents are in range and the
    /// precision is no coarser than the unit.
    pub fn new(time_unit: i8, time_precision: i8) -> Result<Self, RegistryError> {
        check_exponent(time_unit)?;
        check_exponent(time_precision)?;
        if time_precision > time_unit {
            return Err(RegistryError::InvalidTimescale {
                reason: format!(
                    "precision {} is coarser than unit {}",
                    format_timescale(time_precision),
                    format_timescale(time_unit)
                ),
            });
        }
        Ok(Self {
            time_unit,
            time_precision,
        })
    }

    /// Builds a context from the `[model]` table of a layout file.
    pub fn from_model(meta: &ModelMeta) -> Result<Self, RegistryError> {
        let unit = parse_timescale(&meta.time_unit)?;
        let precision = parse_timescale(&meta.time_precision)?;
        Self::new(unit, precision)
    }

    /// Returns the time unit exponent.
    pub fn time_unit(&self) -> i8 {
        self.time_unit
    }

    /// Returns the time precision exponent.
    pub fn time_precision(&self) -> i8 {
        self.time_precision
    }
}

impl Default for SimContext {
    /// `1ps/1ps`.
    fn default() -> Self {
        Self {
            time_unit: -12,
            time_precision: -12,
        }
    }
}

impl fmt::Display for SimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            format_timescale(self.time_unit),
            format_timescale(self.time_precision)
        )
    }
}

/// Rejects exponents outside `MIN_EXPONENT..=MAX_EXPONENT`.
pub(crate) fn check_exponent(exponent: i8) -> Result<(), RegistryError> {
    if (MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        Ok(())
    } else {
        Err(RegistryError::InvalidTimescale {
            reason: format!("exponent {exponent} outside {MIN_EXPONENT}..={MAX_EXPONENT}"),
        })
    }
}
