//! The scope registry: a table of scopes and variable descriptors bound to
//! one simulation model instance.
//!
//! A [`Registry<'m>`] is created while a model is constructed, filled by
//! [`configure`](Registry::configure) and
//! [`insert_variable`](Registry::insert_variable) in the model's static
//! hierarchy order, and torn down (deepest scopes first) before the model's
//! storage is released. The `'m` lifetime ties every storage handle to the
//! model, so the registry cannot outlive it.

use std::collections::{HashMap, HashSet};

use symscope_common::{BitVector, Ident, Interner};
use tracing::debug;

use crate::arena::Arena;
use crate::context::{check_exponent, SimContext};
use crate::descriptor::{BitRange, Direction, StorageKind, VariableDescriptor, VariableSpec};
use crate::error::RegistryError;
use crate::hierarchy::{Attachment, Hierarchy};
use crate::ids::{ScopeId, VarId};
use crate::scope::{Scope, ScopeKind};
use crate::storage::StorageRef;

/// What a qualified name resolves to, by ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// A scope.
    Scope(ScopeId),
    /// A variable.
    Variable(VarId),
}

/// What a qualified name resolves to, by reference.
#[derive(Clone, Copy, Debug)]
pub enum Entry<'r, 'm> {
    /// A scope.
    Scope(&'r Scope),
    /// A variable descriptor.
    Variable(&'r VariableDescriptor<'m>),
}

/// Scopes and variables of one model instance, indexed by qualified name.
pub struct Registry<'m> {
    context: SimContext,
    instance: String,
    interner: Interner,
    scopes: Arena<ScopeId, Scope>,
    variables: Arena<VarId, VariableDescriptor<'m>>,
    index: HashMap<Ident, EntryId>,
    hierarchy: Hierarchy,
    torn_down: bool,
}

/// Creates an empty registry for `instance` under `context`.
pub fn create_registry<'m>(context: &SimContext, instance: &str) -> Registry<'m> {
    Registry::new(context, instance)
}

impl<'m> Registry<'m> {
    /// Creates an empty registry for the model instance named `instance`.
    pub fn new(context: &SimContext, instance: impl Into<String>) -> Self {
        let instance = instance.into();
        debug!(instance = %instance, context = %context, "creating registry");
        Self {
            context: *context,
            instance,
            interner: Interner::new(),
            scopes: Arena::new(),
            variables: Arena::new(),
            index: HashMap::new(),
            hierarchy: Hierarchy::new(),
            torn_down: false,
        }
    }

    /// The simulation context the registry was created with.
    pub fn context(&self) -> &SimContext {
        &self.context
    }

    /// The model instance name every qualified name starts with.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Returns true once [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Registers a scope.
    ///
    /// `qualified_name` is relative to the instance: `"distortion"` becomes
    /// `top.distortion` and the empty string names the instance itself.
    /// Module scopes carry `time_precision`, which must be in range and no
    /// finer than the context precision; other scopes record exponent 0.
    /// The scope is not attached to the hierarchy; see
    /// [`add_hierarchy_edge`](Self::add_hierarchy_edge).
    pub fn configure(
        &mut self,
        scope_name: &str,
        qualified_name: &str,
        time_precision: i8,
        kind: ScopeKind,
    ) -> Result<ScopeId, RegistryError> {
        self.check_live()?;
        let full = self.qualify(qualified_name);
        if self.interner.get(&full).is_some_and(|k| self.index.contains_key(&k)) {
            return Err(RegistryError::DuplicateScope {
                qualified_name: full,
            });
        }
        let exponent = match kind {
            ScopeKind::Module => {
                check_exponent(time_precision)?;
                if time_precision < self.context.time_precision() {
                    return Err(RegistryError::InvalidTimescale {
                        reason: format!(
                            "scope '{full}' precision 1e{time_precision}s is finer than the model precision 1e{}s",
                            self.context.time_precision()
                        ),
                    });
                }
                time_precision
            }
            ScopeKind::Other => 0,
        };

        let key = self.interner.get_or_intern(&full);
        let mut scope = Scope::new(scope_name.to_string(), full, kind, exponent);
        scope.activate();
        debug!(scope = %scope, exponent, "configured scope");
        let id = self.scopes.alloc(scope);
        self.index.insert(key, EntryId::Scope(id));
        Ok(id)
    }

    /// Registers a variable of `scope` backed by `storage`.
    ///
    /// `dims` are the packed `[msb:lsb]` dimensions, outermost first; an
    /// empty slice declares a 1-bit scalar. The storage is recorded by
    /// reference only.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        storage: impl Into<StorageRef<'m>>,
        is_const: bool,
        kind: StorageKind,
        direction: Direction,
        dims: &[BitRange],
    ) -> Result<VarId, RegistryError> {
        let spec = VariableSpec {
            name: name.to_string(),
            kind,
            direction,
            is_const,
            public: true,
            dims: dims.to_vec(),
        };
        self.insert_variable_spec(scope, spec, storage.into())
    }

    /// Registers a variable described by `spec`.
    pub fn insert_variable_spec(
        &mut self,
        scope: ScopeId,
        spec: VariableSpec,
        storage: StorageRef<'m>,
    ) -> Result<VarId, RegistryError> {
        self.check_live()?;
        let full = format!("{}.{}", self.scope(scope)?.qualified_name(), spec.name);
        if self.interner.get(&full).is_some_and(|k| self.index.contains_key(&k)) {
            return Err(RegistryError::DuplicateScope {
                qualified_name: full,
            });
        }
        let name = spec.name.clone();
        let descriptor = VariableDescriptor::new(spec, storage, scope, full.clone())?;
        debug!(variable = %full, width = descriptor.width_bits(), "inserted variable");

        let key = self.interner.get_or_intern(&full);
        let id = self.variables.alloc(descriptor);
        if let Some(s) = self.scopes.get_mut(scope) {
            s.insert_variable(name, id);
        }
        self.index.insert(key, EntryId::Variable(id));
        Ok(id)
    }

    /// Resolves a fully qualified dotted name to an ID.
    pub fn resolve(&self, qualified_name: &str) -> Result<EntryId, RegistryError> {
        let not_found = || RegistryError::NotFound {
            qualified_name: qualified_name.to_string(),
        };
        let key = self.interner.get(qualified_name).ok_or_else(not_found)?;
        let entry = *self.index.get(&key).ok_or_else(not_found)?;
        // Validates the entry is still live.
        match entry {
            EntryId::Scope(id) => self.scope(id).map(|_| entry),
            EntryId::Variable(id) => self.variable(id).map(|_| entry),
        }
    }

    /// Resolves a fully qualified dotted name to a scope or variable.
    pub fn lookup(&self, qualified_name: &str) -> Result<Entry<'_, 'm>, RegistryError> {
        match self.resolve(qualified_name)? {
            EntryId::Scope(id) => self.scope(id).map(Entry::Scope),
            EntryId::Variable(id) => self.variable(id).map(Entry::Variable),
        }
    }

    /// Resolves a qualified name that must name a variable.
    pub fn lookup_variable(
        &self,
        qualified_name: &str,
    ) -> Result<&VariableDescriptor<'m>, RegistryError> {
        match self.lookup(qualified_name)? {
            Entry::Variable(v) => Ok(v),
            Entry::Scope(_) => Err(RegistryError::NotFound {
                qualified_name: qualified_name.to_string(),
            }),
        }
    }

    /// Resolves a qualified name that must name a scope.
    pub fn lookup_scope(&self, qualified_name: &str) -> Result<&Scope, RegistryError> {
        match self.lookup(qualified_name)? {
            Entry::Scope(s) => Ok(s),
            Entry::Variable(_) => Err(RegistryError::NotFound {
                qualified_name: qualified_name.to_string(),
            }),
        }
    }

    /// Returns the scope for `id`, failing if it was torn down.
    pub fn scope(&self, id: ScopeId) -> Result<&Scope, RegistryError> {
        let scope = self.scopes.get(id).ok_or_else(|| RegistryError::NotFound {
            qualified_name: format!("scope #{}", id.as_raw()),
        })?;
        if scope.is_active() {
            Ok(scope)
        } else {
            Err(RegistryError::UseAfterTeardown {
                qualified_name: scope.qualified_name().to_string(),
            })
        }
    }

    /// Returns the descriptor for `id`, failing if its scope was torn down.
    pub fn variable(&self, id: VarId) -> Result<&VariableDescriptor<'m>, RegistryError> {
        let var = self
            .variables
            .get(id)
            .ok_or_else(|| RegistryError::NotFound {
                qualified_name: format!("variable #{}", id.as_raw()),
            })?;
        match self.scopes.get(var.scope()) {
            Some(scope) if scope.is_active() => Ok(var),
            _ => Err(RegistryError::UseAfterTeardown {
                qualified_name: var.qualified_name().to_string(),
            }),
        }
    }

    /// Active scopes in registration order.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        self.scopes.iter().filter(|(_, s)| s.is_active())
    }

    /// Variables of `scope`, ordered by name.
    pub fn variables(
        &self,
        scope: ScopeId,
    ) -> Result<impl Iterator<Item = (VarId, &VariableDescriptor<'m>)> + '_, RegistryError> {
        let scope = self.scope(scope)?;
        Ok(scope
            .variables()
            .values()
            .filter_map(|&id| self.variables.get(id).map(|v| (id, v))))
    }

    /// Children of `parent`, or the root scopes when `parent` is `None`.
    pub fn children(&self, parent: Option<ScopeId>) -> &[ScopeId] {
        match parent {
            None => self.hierarchy.roots(),
            Some(p) => self.hierarchy.children(p),
        }
    }

    /// Parent of `scope`, if it is attached under one.
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.hierarchy.parent(scope)
    }

    /// Pre-order traversal of every active scope with its depth. Root
    /// subtrees come first; detached subtrees follow in registration order.
    pub fn walk(&self) -> Vec<(ScopeId, usize)> {
        let mut out = Vec::new();
        for top in self.subtree_tops() {
            out.extend(self.hierarchy.pre_order(top));
        }
        out
    }

    /// Attaches `child` under `parent`, or at the root when `parent` is
    /// `None`.
    ///
    /// Re-adding an existing edge is a no-op. A root scope may be moved under
    /// a parent. A scope that already has a different parent is a
    /// [`HierarchyConflict`](RegistryError::HierarchyConflict), and an edge
    /// that would make a scope its own ancestor is a
    /// [`HierarchyCycle`](RegistryError::HierarchyCycle).
    pub fn add_hierarchy_edge(
        &mut self,
        parent: Option<ScopeId>,
        child: ScopeId,
    ) -> Result<(), RegistryError> {
        self.check_live()?;
        let child_name = self.scope(child)?.qualified_name().to_string();
        let parent_name = match parent {
            Some(p) => self.scope(p)?.qualified_name().to_string(),
            None => "<root>".to_string(),
        };

        let current = self.hierarchy.attachment(child);
        match (current, parent) {
            (Attachment::Root, None) => return Ok(()),
            (Attachment::Child(p), Some(q)) if p == q => return Ok(()),
            (Attachment::Child(p), _) => {
                return Err(RegistryError::HierarchyConflict {
                    child: child_name,
                    parent: self.scopes[p].qualified_name().to_string(),
                });
            }
            (Attachment::Root, Some(_)) | (Attachment::Detached, _) => {}
        }
        if let Some(p) = parent {
            if self.hierarchy.is_ancestor(child, p) {
                return Err(RegistryError::HierarchyCycle {
                    parent: parent_name,
                    child: child_name,
                });
            }
        }
        if current == Attachment::Root {
            self.hierarchy.detach(None, child);
        }
        self.hierarchy.attach(parent, child);
        debug!(parent = %parent_name, child = %child_name, "added hierarchy edge");
        Ok(())
    }

    /// Removes the edge `parent → child`. Returns whether an edge existed;
    /// removing a missing edge is a no-op. The child stays registered but
    /// detached.
    pub fn remove_hierarchy_edge(&mut self, parent: Option<ScopeId>, child: ScopeId) -> bool {
        let removed = self.hierarchy.detach(parent, child);
        if removed {
            debug!(child = child.as_raw(), "removed hierarchy edge");
        }
        removed
    }

    /// Tears down the subtree rooted at `scope`, children before parents.
    /// Returns the visited qualified names; a torn-down scope yields none.
    pub fn teardown_scope(&mut self, scope: ScopeId) -> Result<Vec<String>, RegistryError> {
        let root = self.scopes.get(scope).ok_or_else(|| RegistryError::NotFound {
            qualified_name: format!("scope #{}", scope.as_raw()),
        })?;
        if !root.is_active() {
            return Ok(Vec::new());
        }
        let order = self.hierarchy.post_order(scope);
        Ok(self.tear_down_in_order(order))
    }

    /// Tears down every scope, attached or not, children before parents.
    ///
    /// Returns the visited qualified names. Afterwards every lookup through
    /// the registry fails with
    /// [`UseAfterTeardown`](RegistryError::UseAfterTeardown) and further
    /// registration is rejected. Calling it again is a no-op.
    pub fn teardown(&mut self) -> Vec<String> {
        if self.torn_down {
            return Vec::new();
        }
        let mut order = Vec::new();
        for top in self.subtree_tops() {
            order.extend(self.hierarchy.post_order(top));
        }
        let visited = self.tear_down_in_order(order);
        self.torn_down = true;
        debug!(instance = %self.instance, scopes = visited.len(), "registry torn down");
        visited
    }

    /// Tears the registry down and releases it.
    pub fn destroy(mut self) -> Vec<String> {
        self.teardown()
    }

    /// Reads a variable by qualified name.
    pub fn peek(&self, qualified_name: &str) -> Result<BitVector, RegistryError> {
        Ok(self.lookup_variable(qualified_name)?.read())
    }

    /// Reads the low 64 bits of a variable by qualified name.
    pub fn peek_u64(&self, qualified_name: &str) -> Result<u64, RegistryError> {
        Ok(self.lookup_variable(qualified_name)?.read_u64())
    }

    /// Writes a variable by qualified name.
    pub fn poke(&self, qualified_name: &str, value: &BitVector) -> Result<(), RegistryError> {
        self.lookup_variable(qualified_name)?.write(value)
    }

    /// Writes a variable from an integer by qualified name.
    pub fn poke_u64(&self, qualified_name: &str, value: u64) -> Result<(), RegistryError> {
        self.lookup_variable(qualified_name)?.write_u64(value)
    }

    fn qualify(&self, qualified_name: &str) -> String {
        if qualified_name.is_empty() {
            self.instance.clone()
        } else {
            format!("{}.{qualified_name}", self.instance)
        }
    }

    fn check_live(&self) -> Result<(), RegistryError> {
        if self.torn_down {
            Err(RegistryError::UseAfterTeardown {
                qualified_name: self.instance.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Active scopes with no parent: roots first, then detached scopes in
    /// registration order.
    fn subtree_tops(&self) -> Vec<ScopeId> {
        let mut tops: Vec<ScopeId> = self
            .hierarchy
            .roots()
            .iter()
            .copied()
            .filter(|&r| self.scopes.get(r).is_some_and(Scope::is_active))
            .collect();
        let seen: HashSet<ScopeId> = tops.iter().copied().collect();
        tops.extend(self.scopes.iter().filter_map(|(id, s)| {
            let detached = self.hierarchy.attachment(id) == Attachment::Detached;
            (s.is_active() && detached && !seen.contains(&id)).then_some(id)
        }));
        tops
    }

    fn tear_down_in_order(&mut self, order: Vec<ScopeId>) -> Vec<String> {
        let mut visited = Vec::with_capacity(order.len());
        for id in order {
            let Some(scope) = self.scopes.get_mut(id) else {
                continue;
            };
            if scope.tear_down() {
                debug!(scope = %scope.qualified_name(), "tore down scope");
                visited.push(scope.qualified_name().to_string());
            }
            self.hierarchy.forget(id);
        }
        visited
    }
}

impl Drop for Registry<'_> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Registry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("instance", &self.instance)
            .field("context", &self.context)
            .field("scopes", &self.scopes.len())
            .field("variables", &self.variables.len())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ctx() -> SimContext {
        SimContext::default()
    }

    #[test]
    fn configure_qualifies_with_instance() {
        let mut reg = Registry::new(&ctx(), "top");
        let top = reg.configure("TOP", "", 0, ScopeKind::Other).unwrap();
        let d = reg
            .configure("distortion", "distortion", -12, ScopeKind::Module)
            .unwrap();
        assert_eq!(reg.scope(top).unwrap().qualified_name(), "top");
        assert_eq!(reg.scope(d).unwrap().qualified_name(), "top.distortion");
        assert_eq!(reg.scope(d).unwrap().time_unit_exponent(), -12);
        assert_eq!(reg.scope(top).unwrap().time_unit_exponent(), 0);
    }

    #[test]
    fn configure_rejects_duplicate() {
        let mut reg = Registry::new(&ctx(), "top");
        reg.configure("d", "d", -12, ScopeKind::Module).unwrap();
        let err = reg.configure("d", "d", -12, ScopeKind::Module).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateScope { .. }));
    }

    #[test]
    fn configure_rejects_precision_finer_than_context() {
        let mut reg = Registry::new(&ctx(), "top");
        let err = reg.configure("d", "d", -15, ScopeKind::Module).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTimescale { .. }));
        assert!(reg.configure("d", "d", -9, ScopeKind::Module).is_ok());
    }

    #[test]
    fn insert_and_lookup_variable() {
        let cell = Cell::new(0u16);
        let mut reg = Registry::new(&ctx(), "top");
        let d = reg.configure("d", "d", -12, ScopeKind::Module).unwrap();
        let id = reg
            .insert_variable(
                d,
                "threshold",
                &cell,
                false,
                StorageKind::Word,
                Direction::In,
                &[BitRange::new(15, 0)],
            )
            .unwrap();
        assert_eq!(
            reg.resolve("top.d.threshold").unwrap(),
            EntryId::Variable(id)
        );
        let var = reg.lookup_variable("top.d.threshold").unwrap();
        assert_eq!(var.width_bits(), 16);
        assert!(reg.lookup_scope("top.d.threshold").is_err());
    }

    #[test]
    fn lookup_missing_is_not_found() {
        let reg = Registry::new(&ctx(), "top");
        assert!(matches!(
            reg.lookup("top.nope"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn edge_readd_is_noop_and_conflict_detected() {
        let mut reg = Registry::new(&ctx(), "top");
        let a = reg.configure("a", "a", -12, ScopeKind::Module).unwrap();
        let b = reg.configure("b", "b", -12, ScopeKind::Module).unwrap();
        let c = reg.configure("c", "c", -12, ScopeKind::Module).unwrap();
        reg.add_hierarchy_edge(None, a).unwrap();
        reg.add_hierarchy_edge(Some(a), b).unwrap();
        reg.add_hierarchy_edge(Some(a), b).unwrap();
        assert_eq!(reg.children(Some(a)), &[b]);
        let err = reg.add_hierarchy_edge(Some(c), b).unwrap_err();
        assert!(matches!(err, RegistryError::HierarchyConflict { .. }));
    }

    #[test]
    fn edge_cycle_rejected() {
        let mut reg = Registry::new(&ctx(), "top");
        let a = reg.configure("a", "a", -12, ScopeKind::Module).unwrap();
        let b = reg.configure("b", "b", -12, ScopeKind::Module).unwrap();
        reg.add_hierarchy_edge(None, a).unwrap();
        reg.add_hierarchy_edge(Some(a), b).unwrap();
        let err = reg.add_hierarchy_edge(Some(b), a).unwrap_err();
        assert!(matches!(err, RegistryError::HierarchyCycle { .. }));
        let err = reg.add_hierarchy_edge(Some(a), a).unwrap_err();
        assert!(matches!(err, RegistryError::HierarchyCycle { .. }));
    }

    #[test]
    fn root_scope_can_move_under_parent() {
        let mut reg = Registry::new(&ctx(), "top");
        let a = reg.configure("a", "a", -12, ScopeKind::Module).unwrap();
        let b = reg.configure("b", "b", -12, ScopeKind::Module).unwrap();
        reg.add_hierarchy_edge(None, a).unwrap();
        reg.add_hierarchy_edge(None, b).unwrap();
        reg.add_hierarchy_edge(Some(a), b).unwrap();
        assert_eq!(reg.children(None), &[a]);
        assert_eq!(reg.parent(b), Some(a));
    }

    #[test]
    fn teardown_includes_detached_scopes() {
        let mut reg = Registry::new(&ctx(), "top");
        let a = reg.configure("a", "a", -12, ScopeKind::Module).unwrap();
        let _loose = reg.configure("loose", "loose", -12, ScopeKind::Module).unwrap();
        reg.add_hierarchy_edge(None, a).unwrap();
        assert_eq!(reg.teardown(), vec!["top.a", "top.loose"]);
        assert!(reg.teardown().is_empty());
        assert!(reg.is_torn_down());
    }

    #[test]
    fn register_after_teardown_fails() {
        let mut reg = Registry::new(&ctx(), "top");
        reg.teardown();
        let err = reg.configure("a", "a", -12, ScopeKind::Module).unwrap_err();
        assert!(matches!(err, RegistryError::UseAfterTeardown { .. }));
    }

    #[test]
    fn walk_reports_depth() {
        let mut reg = Registry::new(&ctx(), "top");
        let top = reg.configure("TOP", "", 0, ScopeKind::Other).unwrap();
        let d = reg.configure("d", "d", -12, ScopeKind::Module).unwrap();
        reg.add_hierarchy_edge(None, top).unwrap();
        reg.add_hierarchy_edge(Some(top), d).unwrap();
        assert_eq!(reg.walk(), vec![(top, 0), (d, 1)]);
    }
}
