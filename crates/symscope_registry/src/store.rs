//! Signal storage allocated from a layout file, and a registry built over it.
//!
//! A harness that only has a `symscope.toml` (no compiled model) can still
//! inspect and drive the described state: [`SignalStore::from_layout`] owns
//! one correctly-typed cell per declared variable, and [`build_registry`]
//! registers scopes, variables and hierarchy edges against that storage the
//! same way generated binding code would.

use std::cell::Cell;
use std::collections::HashMap;

use symscope_common::{BitVector, MAX_WIDTH};
use symscope_config::{
    parse_timescale, DirectionDecl, LayoutConfig, RangeDecl, ScopeKindDecl, StorageKindDecl,
    ValueDecl, VarDecl,
};
use tracing::debug;

use crate::context::SimContext;
use crate::descriptor::{packed_width, BitRange, Direction, StorageKind, VariableSpec};
use crate::error::RegistryError;
use crate::ids::ScopeId;
use crate::registry::Registry;
use crate::scope::ScopeKind;
use crate::storage::StorageRef;

/// One owned storage cell.
#[derive(Debug)]
enum Slot {
    U8(Cell<u8>),
    U16(Cell<u16>),
    U32(Cell<u32>),
    U64(Cell<u64>),
    Words(Box<[Cell<u32>]>),
}

impl Slot {
    fn for_kind(kind: StorageKind, words: u32) -> Self {
        match kind {
            StorageKind::Bit | StorageKind::Byte => Slot::U8(Cell::new(0)),
            StorageKind::Word => Slot::U16(Cell::new(0)),
            StorageKind::DoubleWord => Slot::U32(Cell::new(0)),
            StorageKind::QuadWord => Slot::U64(Cell::new(0)),
            StorageKind::Array => Slot::Words((0..words).map(|_| Cell::new(0)).collect()),
        }
    }

    fn as_storage(&self) -> StorageRef<'_> {
        match self {
            Slot::U8(c) => StorageRef::U8(c),
            Slot::U16(c) => StorageRef::U16(c),
            Slot::U32(c) => StorageRef::U32(c),
            Slot::U64(c) => StorageRef::U64(c),
            Slot::Words(w) => StorageRef::Words(&w[..]),
        }
    }
}

/// Owned cells for every variable of a layout, indexed by scope then
/// variable declaration order.
#[derive(Debug, Default)]
pub struct SignalStore {
    slots: Vec<Vec<Slot>>,
}

impl SignalStore {
    /// Allocates zeroed storage for every declared variable and applies the
    /// declared initial values.
    ///
    /// Array variables get `words` 32-bit words, or just enough for their
    /// width when `words` is absent. Neither may exceed [`MAX_WIDTH`] bits.
    pub fn from_layout(config: &LayoutConfig) -> Result<Self, RegistryError> {
        let mut slots = Vec::with_capacity(config.scopes.len());
        for scope in &config.scopes {
            let mut scope_slots = Vec::with_capacity(scope.vars.len());
            for var in &scope.vars {
                let width = packed_width(&var.name, &dims(&var.range))?;
                let words = array_words(var, width)?;
                let slot = Slot::for_kind(var.kind.into(), words);
                if let Some(value) = initial_value(var)? {
                    slot.as_storage()
                        .store(&value, width.min(slot.as_storage().capacity_bits()));
                }
                scope_slots.push(slot);
            }
            slots.push(scope_slots);
        }
        Ok(Self { slots })
    }

    /// Number of allocated cells.
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Returns true if no cells were allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn storage(&self, scope: usize, var: usize) -> Option<StorageRef<'_>> {
        self.slots.get(scope)?.get(var).map(Slot::as_storage)
    }
}

/// Registers every scope, variable and hierarchy edge of `config` against
/// `store`, which must have been allocated from the same layout.
pub fn build_registry<'m>(
    config: &LayoutConfig,
    store: &'m SignalStore,
) -> Result<Registry<'m>, RegistryError> {
    let context = SimContext::from_model(&config.model)?;
    let mut registry = Registry::new(&context, config.model.instance.as_str());
    let mut by_name: HashMap<&str, ScopeId> = HashMap::new();

    for (si, decl) in config.scopes.iter().enumerate() {
        let precision = match &decl.time_precision {
            Some(text) => parse_timescale(text)?,
            None => context.time_precision(),
        };
        let id = registry.configure(
            &decl.name,
            decl.qualified_name(),
            precision,
            decl.kind.into(),
        )?;

        for (vi, var) in decl.vars.iter().enumerate() {
            let storage = store
                .storage(si, vi)
                .ok_or_else(|| RegistryError::NotFound {
                    qualified_name: format!("storage for '{}'", var.name),
                })?;
            registry.insert_variable_spec(id, spec_for(var), storage)?;
        }

        let parent = match &decl.parent {
            Some(name) => Some(*by_name.get(name.as_str()).ok_or_else(|| {
                RegistryError::NotFound {
                    qualified_name: name.clone(),
                }
            })?),
            None => None,
        };
        registry.add_hierarchy_edge(parent, id)?;
        by_name.insert(decl.qualified_name(), id);
    }

    debug!(
        instance = %config.model.instance,
        scopes = config.scopes.len(),
        cells = store.len(),
        "built registry from layout"
    );
    Ok(registry)
}

fn array_words(var: &VarDecl, width: u32) -> Result<u32, RegistryError> {
    let words = var.words.unwrap_or_else(|| width.div_ceil(32)).max(1);
    if words > MAX_WIDTH / 32 {
        return Err(RegistryError::InvalidWidth {
            name: var.name.clone(),
            reason: format!("{words} words exceed {MAX_WIDTH} bits"),
        });
    }
    Ok(words)
}

fn spec_for(var: &VarDecl) -> VariableSpec {
    VariableSpec {
        name: var.name.clone(),
        kind: var.kind.into(),
        direction: var.direction.into(),
        is_const: var.is_const,
        public: var.public,
        dims: dims(&var.range),
    }
}

fn dims(ranges: &[RangeDecl]) -> Vec<BitRange> {
    ranges.iter().map(|r| BitRange::new(r.msb, r.lsb)).collect()
}

fn initial_value(var: &VarDecl) -> Result<Option<BitVector>, RegistryError> {
    Ok(match &var.value {
        None => None,
        Some(ValueDecl::Int(v)) => Some(BitVector::from_u64(*v, 64)),
        Some(ValueDecl::Text(text)) => Some(BitVector::parse(text)?),
    })
}

impl From<StorageKindDecl> for StorageKind {
    fn from(decl: StorageKindDecl) -> Self {
        match decl {
            StorageKindDecl::Bit => StorageKind::Bit,
            StorageKindDecl::Byte => StorageKind::Byte,
            StorageKindDecl::Word => StorageKind::Word,
            StorageKindDecl::DoubleWord => StorageKind::DoubleWord,
            StorageKindDecl::QuadWord => StorageKind::QuadWord,
            StorageKindDecl::Array => StorageKind::Array,
        }
    }
}

impl From<DirectionDecl> for Direction {
    fn from(decl: DirectionDecl) -> Self {
        match decl {
            DirectionDecl::In => Direction::In,
            DirectionDecl::Out => Direction::Out,
            DirectionDecl::InOut => Direction::InOut,
            DirectionDecl::Internal => Direction::Internal,
            DirectionDecl::Const => Direction::Const,
        }
    }
}

impl From<ScopeKindDecl> for ScopeKind {
    fn from(decl: ScopeKindDecl) -> Self {
        match decl {
            ScopeKindDecl::Module => ScopeKind::Module,
            ScopeKindDecl::Other => ScopeKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symscope_config::load_layout_from_str;

    const LAYOUT: &str = r#"
[model]
instance = "top"

[[scope]]
name = "TOP"
qualified = ""
kind = "other"

[[scope.var]]
name = "clk"
kind = "byte"
direction = "in"

[[scope]]
name = "distortion"
kind = "module"
parent = ""

[[scope.var]]
name = "width"
kind = "double_word"
const = true
value = 16
range = [31, 0]

[[scope.var]]
name = "wide"
kind = "array"
range = [69, 0]
value = "70'h3f_0000_0000_0000_0001"
"#;

    #[test]
    fn store_allocates_one_cell_per_var() {
        let config = load_layout_from_str(LAYOUT).unwrap();
        let store = SignalStore::from_layout(&config).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.storage(1, 1).unwrap().capacity_bits(), 96);
    }

    #[test]
    fn initial_values_are_applied() {
        let config = load_layout_from_str(LAYOUT).unwrap();
        let store = SignalStore::from_layout(&config).unwrap();
        let registry = build_registry(&config, &store).unwrap();
        assert_eq!(registry.peek_u64("top.distortion.width").unwrap(), 16);
        let wide = registry.peek("top.distortion.wide").unwrap();
        assert_eq!(wide.width(), 70);
        assert!(wide.get(69));
        assert!(wide.get(0));
        assert!(!wide.get(1));
    }

    #[test]
    fn parents_become_hierarchy_edges() {
        let config = load_layout_from_str(LAYOUT).unwrap();
        let store = SignalStore::from_layout(&config).unwrap();
        let registry = build_registry(&config, &store).unwrap();
        let top = registry.lookup_scope("top").unwrap();
        assert_eq!(top.kind(), ScopeKind::Other);
        let walk: Vec<(String, usize)> = registry
            .walk()
            .into_iter()
            .map(|(id, depth)| (registry.scope(id).unwrap().qualified_name().to_string(), depth))
            .collect();
        assert_eq!(
            walk,
            vec![("top".to_string(), 0), ("top.distortion".to_string(), 1)]
        );
    }

    #[test]
    fn const_var_rejects_poke() {
        let config = load_layout_from_str(LAYOUT).unwrap();
        let store = SignalStore::from_layout(&config).unwrap();
        let registry = build_registry(&config, &store).unwrap();
        assert!(matches!(
            registry.poke_u64("top.distortion.width", 3),
            Err(RegistryError::ReadOnlyViolation { .. })
        ));
        assert_eq!(registry.peek_u64("top.distortion.width").unwrap(), 16);
    }

    #[test]
    fn inverted_range_reports_invalid_width() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "core"

[[scope.var]]
name = "bad"
kind = "word"
range = [0, 15]
"#;
        let config = load_layout_from_str(toml).unwrap();
        let err = SignalStore::from_layout(&config).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidWidth { .. }));
    }

    #[test]
    fn oversized_array_is_rejected_before_allocation() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "core"

[[scope.var]]
name = "mem"
kind = "array"
range = [1073741823, 0]
"#;
        let config = load_layout_from_str(toml).unwrap();
        let err = SignalStore::from_layout(&config).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidWidth { ref name, .. } if name == "mem"));

        let toml = toml.replace("range = [1073741823, 0]", "range = [31, 0]\nwords = 4000000000");
        let config = load_layout_from_str(&toml).unwrap();
        let err = SignalStore::from_layout(&config).unwrap_err();
        assert!(err.to_string().contains("4000000000 words"));
    }
}
