//! Registry error types.
//!
//! All errors that can occur while registering scopes and variables or
//! while accessing variable storage are variants of [`RegistryError`].
//! None of them is fatal: each is returned from the offending call.

use symscope_common::ParseValueError;
use symscope_config::ConfigError;

/// Errors returned by registry construction, introspection and access.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A scope or variable with this qualified name is already registered.
    #[error("duplicate entry '{qualified_name}'")]
    DuplicateScope {
        /// The colliding qualified name.
        qualified_name: String,
    },

    /// Declared bit bounds are inconsistent or do not fit the storage kind.
    #[error("invalid width for '{name}': {reason}")]
    InvalidWidth {
        /// The variable being inserted.
        name: String,
        /// What was wrong with the declared bounds.
        reason: String,
    },

    /// No scope or variable has this qualified name.
    #[error("'{qualified_name}' not found")]
    NotFound {
        /// The name that failed to resolve.
        qualified_name: String,
    },

    /// A write was attempted through a constant or non-public descriptor.
    #[error("'{qualified_name}' is read-only")]
    ReadOnlyViolation {
        /// The variable that was written.
        qualified_name: String,
    },

    /// The scope (or the scope owning a variable) has been torn down.
    #[error("'{qualified_name}' used after teardown")]
    UseAfterTeardown {
        /// The torn-down entry.
        qualified_name: String,
    },

    /// The storage handle does not match the declared storage kind.
    #[error("storage for '{name}' is {found}, expected {expected}")]
    StorageMismatch {
        /// The variable being inserted.
        name: String,
        /// The storage the kind requires.
        expected: &'static str,
        /// The storage that was supplied.
        found: &'static str,
    },

    /// A time unit or precision exponent is out of range or inconsistent.
    #[error("invalid timescale: {reason}")]
    InvalidTimescale {
        /// Description of the inconsistency.
        reason: String,
    },

    /// The child scope already has a different parent.
    #[error("scope '{child}' is already attached under '{parent}'")]
    HierarchyConflict {
        /// The child being attached.
        child: String,
        /// Its current parent (`<root>` for a root scope).
        parent: String,
    },

    /// Attaching the edge would make a scope its own ancestor.
    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    HierarchyCycle {
        /// The proposed parent.
        parent: String,
        /// The proposed child.
        child: String,
    },

    /// A textual value could not be parsed.
    #[error("invalid value: {0}")]
    InvalidValue(#[from] ParseValueError),

    /// The layout file could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_scope_display() {
        let e = RegistryError::DuplicateScope {
            qualified_name: "top.distortion".into(),
        };
        assert_eq!(e.to_string(), "duplicate entry 'top.distortion'");
    }

    #[test]
    fn invalid_width_display() {
        let e = RegistryError::InvalidWidth {
            name: "threshold".into(),
            reason: "msb 0 < lsb 15".into(),
        };
        assert_eq!(e.to_string(), "invalid width for 'threshold': msb 0 < lsb 15");
    }

    #[test]
    fn not_found_display() {
        let e = RegistryError::NotFound {
            qualified_name: "top.nope".into(),
        };
        assert_eq!(e.to_string(), "'top.nope' not found");
    }

    #[test]
    fn read_only_display() {
        let e = RegistryError::ReadOnlyViolation {
            qualified_name: "top.distortion.width".into(),
        };
        assert_eq!(e.to_string(), "'top.distortion.width' is read-only");
    }

    #[test]
    fn use_after_teardown_display() {
        let e = RegistryError::UseAfterTeardown {
            qualified_name: "top".into(),
        };
        assert_eq!(e.to_string(), "'top' used after teardown");
    }

    #[test]
    fn storage_mismatch_display() {
        let e = RegistryError::StorageMismatch {
            name: "clk".into(),
            expected: "u8 cell",
            found: "u16 cell",
        };
        assert_eq!(e.to_string(), "storage for 'clk' is u16 cell, expected u8 cell");
    }

    #[test]
    fn hierarchy_cycle_display() {
        let e = RegistryError::HierarchyCycle {
            parent: "top.a.b".into(),
            child: "top.a".into(),
        };
        assert_eq!(
            e.to_string(),
            "attaching 'top.a' under 'top.a.b' would create a cycle"
        );
    }

    #[test]
    fn invalid_value_from_parse_error() {
        let e: RegistryError = ParseValueError::Empty.into();
        assert_eq!(e.to_string(), "invalid value: empty value");
    }

    #[test]
    fn config_error_is_transparent() {
        let e: RegistryError = ConfigError::MissingField("model.instance".into()).into();
        assert_eq!(e.to_string(), "missing required field: model.instance");
    }
}
