//! Serializable snapshot of a registry's names and shapes.
//!
//! External tooling caches qualified name → handle maps. The layout lists
//! everything such a map depends on, and [`Layout::fingerprint`] condenses
//! it to one hash so a stale cache can be detected by comparison.

use serde::{Deserialize, Serialize};
use symscope_common::ContentHash;

use crate::descriptor::{BitRange, Direction, StorageKind};
use crate::registry::Registry;
use crate::scope::ScopeKind;

/// Registry snapshot: instance, timescale and every active scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Model instance name.
    pub instance: String,
    /// Time unit exponent.
    pub time_unit: i8,
    /// Time precision exponent.
    pub time_precision: i8,
    /// Scopes in registration order.
    pub scopes: Vec<ScopeLayout>,
}

/// One scope of a [`Layout`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeLayout {
    /// Short name.
    pub name: String,
    /// Fully qualified name.
    pub qualified_name: String,
    /// Scope kind.
    pub kind: ScopeKind,
    /// Time precision exponent (0 for non-module scopes).
    pub time_precision: i8,
    /// Qualified name of the parent, if attached under one.
    pub parent: Option<String>,
    /// Variables ordered by name.
    pub variables: Vec<VarLayout>,
}

/// One variable of a [`ScopeLayout`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarLayout {
    /// Name within the scope.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Direction.
    pub direction: Direction,
    /// Storage layout.
    pub storage: StorageKind,
    /// Packed dimensions.
    pub dims: Vec<BitRange>,
    /// Whether the variable is writable from outside.
    pub public: bool,
}

impl Layout {
    /// Captures the active scopes and variables of `registry`.
    pub fn capture(registry: &Registry<'_>) -> Self {
        let scopes = registry
            .scopes()
            .map(|(id, scope)| {
                let parent = registry
                    .parent(id)
                    .and_then(|p| registry.scope(p).ok())
                    .map(|p| p.qualified_name().to_string());
                let variables = registry
                    .variables(id)
                    .map(|vars| {
                        vars.map(|(_, v)| VarLayout {
                            name: v.name().to_string(),
                            width: v.width_bits(),
                            direction: v.direction(),
                            storage: v.storage_kind(),
                            dims: v.dims().to_vec(),
                            public: v.is_public(),
                        })
                        .collect()
                    })
                    .unwrap_or_default();
                ScopeLayout {
                    name: scope.name().to_string(),
                    qualified_name: scope.qualified_name().to_string(),
                    kind: scope.kind(),
                    time_precision: scope.time_unit_exponent(),
                    parent,
                    variables,
                }
            })
            .collect();
        Self {
            instance: registry.instance().to_string(),
            time_unit: registry.context().time_unit(),
            time_precision: registry.context().time_precision(),
            scopes,
        }
    }

    /// Hash of the canonical JSON encoding.
    pub fn fingerprint(&self) -> Result<ContentHash, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(ContentHash::from_bytes(&bytes))
    }

    /// Total number of variables across all scopes.
    pub fn variable_count(&self) -> usize {
        self.scopes.iter().map(|s| s.variables.len()).sum()
    }
}

impl Registry<'_> {
    /// Snapshot of the registry's active scopes and variables.
    pub fn layout(&self) -> Layout {
        Layout::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use std::cell::Cell;

    #[test]
    fn capture_lists_scopes_and_parents() {
        let clk = Cell::new(0u8);
        let mut reg = Registry::new(&SimContext::default(), "top");
        let top = reg.configure("TOP", "", 0, ScopeKind::Other).unwrap();
        let d = reg.configure("d", "d", -12, ScopeKind::Module).unwrap();
        reg.add_hierarchy_edge(None, top).unwrap();
        reg.add_hierarchy_edge(Some(top), d).unwrap();
        reg.insert_variable(d, "clk", &clk, false, StorageKind::Byte, Direction::In, &[])
            .unwrap();

        let layout = reg.layout();
        assert_eq!(layout.instance, "top");
        assert_eq!(layout.scopes.len(), 2);
        assert_eq!(layout.scopes[0].parent, None);
        assert_eq!(layout.scopes[1].parent.as_deref(), Some("top"));
        assert_eq!(layout.scopes[1].variables[0].width, 1);
        assert_eq!(layout.variable_count(), 1);
    }

    #[test]
    fn fingerprint_tracks_shape_not_values() {
        let clk = Cell::new(0u8);
        let rst = Cell::new(0u8);
        let mut reg = Registry::new(&SimContext::default(), "top");
        let d = reg.configure("d", "d", -12, ScopeKind::Module).unwrap();
        reg.insert_variable(d, "clk", &clk, false, StorageKind::Byte, Direction::In, &[])
            .unwrap();
        let before = reg.layout().fingerprint().unwrap();
        reg.poke_u64("top.d.clk", 1).unwrap();
        assert_eq!(reg.layout().fingerprint().unwrap(), before);

        reg.insert_variable(d, "rst", &rst, false, StorageKind::Byte, Direction::In, &[])
            .unwrap();
        assert_ne!(reg.layout().fingerprint().unwrap(), before);
    }

    #[test]
    fn layout_json_roundtrip() {
        let reg = Registry::new(&SimContext::default(), "top");
        let layout = reg.layout();
        let json = serde_json::to_string(&layout).unwrap();
        let back: Layout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
