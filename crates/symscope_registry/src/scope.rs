//! Scope nodes of the simulated hierarchy.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::VarId;

/// What a scope represents. Only a few fields differ between kinds, so this
/// is a tag rather than a trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// A module instance; carries its own time precision.
    Module,
    /// Any other grouping, such as the synthetic top-level scope.
    Other,
}

/// Lifecycle of a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeState {
    /// Allocated but not yet validated.
    Unregistered,
    /// Registered and usable.
    Active,
    /// Released; every further access fails.
    TornDown,
}

/// A named node grouping variables.
#[derive(Debug)]
pub struct Scope {
    name: String,
    qualified_name: String,
    kind: ScopeKind,
    time_unit_exponent: i8,
    state: ScopeState,
    variables: BTreeMap<String, VarId>,
}

impl Scope {
    pub(crate) fn new(
        name: String,
        qualified_name: String,
        kind: ScopeKind,
        time_unit_exponent: i8,
    ) -> Self {
        Self {
            name,
            qualified_name,
            kind,
            time_unit_exponent,
            state: ScopeState::Unregistered,
            variables: BTreeMap::new(),
        }
    }

    /// Short scope name (e.g. `distortion`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified dotted name (e.g. `top.distortion`).
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Scope kind.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Time precision exponent of a module scope; 0 for other scopes.
    pub fn time_unit_exponent(&self) -> i8 {
        self.time_unit_exponent
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Returns true while the scope is usable.
    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }

    /// Variable IDs keyed by name, in name order.
    pub fn variables(&self) -> &BTreeMap<String, VarId> {
        &self.variables
    }

    /// Looks up a variable by its short name.
    pub fn variable(&self, name: &str) -> Option<VarId> {
        self.variables.get(name).copied()
    }

    pub(crate) fn activate(&mut self) {
        if self.state == ScopeState::Unregistered {
            self.state = ScopeState::Active;
        }
    }

    pub(crate) fn insert_variable(&mut self, name: String, id: VarId) {
        self.variables.insert(name, id);
    }

    /// Moves to `TornDown` and drops the variable table. Returns false if
    /// the scope was already torn down.
    pub(crate) fn tear_down(&mut self) -> bool {
        if self.state == ScopeState::TornDown {
            return false;
        }
        self.state = ScopeState::TornDown;
        self.variables.clear();
        true
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScopeKind::Module => write!(f, "module {}", self.qualified_name),
            ScopeKind::Other => write!(f, "scope {}", self.qualified_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        let mut scope = Scope::new("d".into(), "top.d".into(), ScopeKind::Module, -12);
        assert_eq!(scope.state(), ScopeState::Unregistered);
        scope.activate();
        assert!(scope.is_active());
        scope.insert_variable("x".into(), VarId::from_raw(0));
        assert!(scope.tear_down());
        assert_eq!(scope.state(), ScopeState::TornDown);
        assert!(scope.variables().is_empty());
        assert!(!scope.tear_down());
    }

    #[test]
    fn activate_does_not_revive() {
        let mut scope = Scope::new("d".into(), "top.d".into(), ScopeKind::Other, 0);
        scope.activate();
        scope.tear_down();
        scope.activate();
        assert_eq!(scope.state(), ScopeState::TornDown);
    }

    #[test]
    fn variables_are_name_ordered() {
        let mut scope = Scope::new("d".into(), "top.d".into(), ScopeKind::Module, -12);
        scope.insert_variable("threshold".into(), VarId::from_raw(0));
        scope.insert_variable("clk".into(), VarId::from_raw(1));
        let names: Vec<&str> = scope.variables().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["clk", "threshold"]);
        assert_eq!(scope.variable("clk"), Some(VarId::from_raw(1)));
    }

    #[test]
    fn display_by_kind() {
        let m = Scope::new("d".into(), "top.d".into(), ScopeKind::Module, -12);
        let o = Scope::new("TOP".into(), "top".into(), ScopeKind::Other, 0);
        assert_eq!(m.to_string(), "module top.d");
        assert_eq!(o.to_string(), "scope top");
    }
}
