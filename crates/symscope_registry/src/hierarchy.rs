//! Parent/child edges between scopes.
//!
//! The index is kept separate from scope registration: a scope may be
//! registered without being attached, attached at the root (`parent = None`),
//! or attached under another scope. Each scope has at most one parent.

use std::collections::HashMap;

use crate::ids::ScopeId;

/// Tree edges over registered scopes.
#[derive(Debug, Default)]
pub struct Hierarchy {
    roots: Vec<ScopeId>,
    children: HashMap<ScopeId, Vec<ScopeId>>,
    parents: HashMap<ScopeId, ScopeId>,
}

/// Where a scope currently hangs in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    /// Not attached anywhere.
    Detached,
    /// A root scope.
    Root,
    /// Child of the given scope.
    Child(ScopeId),
}

impl Hierarchy {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns where `scope` is attached.
    pub fn attachment(&self, scope: ScopeId) -> Attachment {
        if let Some(&parent) = self.parents.get(&scope) {
            Attachment::Child(parent)
        } else if self.roots.contains(&scope) {
            Attachment::Root
        } else {
            Attachment::Detached
        }
    }

    /// Returns the parent of `scope`, if it is attached under one.
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.parents.get(&scope).copied()
    }

    /// Root scopes in attachment order.
    pub fn roots(&self) -> &[ScopeId] {
        &self.roots
    }

    /// Children of `scope` in attachment order.
    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        self.children.get(&scope).map_or(&[], Vec::as_slice)
    }

    /// Returns true if `ancestor` is `scope` or lies above it.
    pub fn is_ancestor(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            if s == ancestor {
                return true;
            }
            cur = self.parent(s);
        }
        false
    }

    /// Attaches a detached `child` under `parent` (or at the root).
    ///
    /// The caller checks for conflicts and cycles first.
    pub(crate) fn attach(&mut self, parent: Option<ScopeId>, child: ScopeId) {
        match parent {
            None => self.roots.push(child),
            Some(p) => {
                self.children.entry(p).or_default().push(child);
                self.parents.insert(child, p);
            }
        }
    }

    /// Removes the edge `parent → child` if present. Returns whether an edge
    /// was removed; removing an absent edge is a no-op.
    pub fn detach(&mut self, parent: Option<ScopeId>, child: ScopeId) -> bool {
        match parent {
            None => {
                let before = self.roots.len();
                self.roots.retain(|&r| r != child);
                self.roots.len() != before
            }
            Some(p) => {
                if self.parents.get(&child) != Some(&p) {
                    return false;
                }
                self.parents.remove(&child);
                if let Some(list) = self.children.get_mut(&p) {
                    list.retain(|&c| c != child);
                }
                true
            }
        }
    }

    /// Drops every edge touching `scope`: its parent link, its root entry and
    /// its child list. Children keep existing but become detached.
    pub(crate) fn forget(&mut self, scope: ScopeId) {
        if let Some(p) = self.parents.remove(&scope) {
            if let Some(list) = self.children.get_mut(&p) {
                list.retain(|&c| c != scope);
            }
        }
        self.roots.retain(|&r| r != scope);
        if let Some(kids) = self.children.remove(&scope) {
            for kid in kids {
                self.parents.remove(&kid);
            }
        }
    }

    /// Post-order traversal of the subtree rooted at `scope`: every child
    /// subtree (in attachment order) before its parent.
    pub fn post_order(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut stack = vec![(scope, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                out.push(node);
                continue;
            }
            stack.push((node, true));
            for &child in self.children(node).iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }

    /// Pre-order traversal with depth, for tree printing.
    pub fn pre_order(&self, scope: ScopeId) -> Vec<(ScopeId, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(scope, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            out.push((node, depth));
            for &child in self.children(node).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
