//! Alias binding, lookup, and anonymous-alias generation.
//!
//! Bindings are an insertion-ordered list rather than a map: a later `bind`
//! with the same alias shadows an earlier one, and lookup scans newest-first
//! so the most recent binding wins. Lookup never walks to the parent scope
//! on its own; whether outer bindings are visible to a nested fragment is
//! host policy, exposed separately as [`ScopeStack::lookup_visible`].

use super::{Scope, ScopeId, ScopeStack};
use smol_str::{SmolStr, format_smolstr};
use tracing::trace;

/// Conventional prefix for system-generated aliases.
///
/// Reserved by convention, not enforcement: `fresh_alias` performs no
/// collision check against user-supplied names.
pub const ANON_ALIAS_PREFIX: &str = "_anon";

impl<R> Scope<R> {
    /// Appends `(alias, referent)` to this scope's bindings.
    ///
    /// Rebinding is permitted: no duplicate check is made, and a later
    /// binding with the same alias shadows the earlier one for lookups.
    pub fn bind(&mut self, alias: impl Into<SmolStr>, referent: R) {
        let alias = alias.into();
        trace!(scope = self.id().as_usize(), alias = %alias, "bind alias");
        self.bound.push((alias, referent));
    }

    /// Finds the most recent binding of `alias` in this scope only.
    ///
    /// Returns `None` when the alias is unbound here, including the common
    /// case of a fresh scope with no bindings yet. Whether that is an error
    /// is the caller's decision.
    pub fn lookup(&self, alias: &str) -> Option<&R> {
        self.bound
            .iter()
            .rev()
            .find(|(name, _)| name.as_str() == alias)
            .map(|(_, referent)| referent)
    }

    /// Iterates the bindings of this scope in insertion order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &R)> {
        self.bound
            .iter()
            .map(|(alias, referent)| (alias.as_str(), referent))
    }

    /// Mints the next anonymous alias: `prefix` followed by this scope's
    /// counter value, which then increments.
    ///
    /// The counter starts at 0 in every scope independently of the parent,
    /// so the generated sequence is deterministic per scope.
    pub fn fresh_alias(&mut self, prefix: &str) -> SmolStr {
        let alias = format_smolstr!("{prefix}{}", self.next_anon);
        self.next_anon += 1;
        trace!(scope = self.id().as_usize(), alias = %alias, "fresh anonymous alias");
        alias
    }
}

impl<R> ScopeStack<R> {
    /// Resolves `alias` starting at `from` and walking ancestor scopes.
    ///
    /// This is the opt-in policy helper for hosts that let nested fragments
    /// see outer bindings; a binding in a closer scope shadows any
    /// same-named binding further out.
    pub fn lookup_visible(&self, from: ScopeId, alias: &str) -> Option<&R> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(referent) = scope.lookup(alias) {
                return Some(referent);
            }
            current = scope.parent();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::QueryText;
    use crate::scope::{GraphContext, NullHooks};
    use std::sync::Arc;

    fn stack() -> (ScopeStack<u32>, ScopeId) {
        let mut scopes = ScopeStack::new();
        let root = scopes.push_root(
            QueryText::new("MATCH (n)"),
            Arc::new(NullHooks),
            Arc::new(GraphContext::new("g")),
        );
        (scopes, root)
    }

    #[test]
    fn lookup_on_empty_scope_is_not_found() {
        let (scopes, root) = stack();
        assert_eq!(scopes.get(root).lookup("n"), None);
    }

    #[test]
    fn rebind_shadows_earlier_binding() {
        let (mut scopes, root) = stack();
        let scope = scopes.get_mut(root);
        scope.bind("n", 1);
        scope.bind("m", 2);
        scope.bind("n", 3);

        assert_eq!(scope.lookup("n"), Some(&3));
        assert_eq!(scope.lookup("m"), Some(&2));
        // Both bindings of "n" remain in insertion order.
        let aliases: Vec<_> = scope.bindings().map(|(alias, _)| alias).collect();
        assert_eq!(aliases, ["n", "m", "n"]);
    }

    #[test]
    fn fresh_alias_sequence_is_deterministic() {
        let (mut scopes, root) = stack();
        let scope = scopes.get_mut(root);
        assert_eq!(scope.fresh_alias(ANON_ALIAS_PREFIX), "_anon0");
        assert_eq!(scope.fresh_alias(ANON_ALIAS_PREFIX), "_anon1");
        assert_eq!(scope.fresh_alias("_v"), "_v2");
    }

    #[test]
    fn child_counter_does_not_inherit_parent_counter() {
        let (mut scopes, root) = stack();
        for _ in 0..5 {
            scopes.get_mut(root).fresh_alias(ANON_ALIAS_PREFIX);
        }
        let child = scopes.push_child(root);
        assert_eq!(
            scopes.get_mut(child).fresh_alias(ANON_ALIAS_PREFIX),
            "_anon0"
        );
    }

    #[test]
    fn lookup_does_not_walk_to_parent() {
        let (mut scopes, root) = stack();
        scopes.get_mut(root).bind("outer", 1);
        let child = scopes.push_child(root);

        assert_eq!(scopes.get(child).lookup("outer"), None);
    }

    #[test]
    fn lookup_visible_walks_ancestors_with_shadowing() {
        let (mut scopes, root) = stack();
        scopes.get_mut(root).bind("a", 1);
        scopes.get_mut(root).bind("b", 2);
        let child = scopes.push_child(root);
        scopes.get_mut(child).bind("a", 10);

        assert_eq!(scopes.lookup_visible(child, "a"), Some(&10));
        assert_eq!(scopes.lookup_visible(child, "b"), Some(&2));
        assert_eq!(scopes.lookup_visible(child, "c"), None);
        assert_eq!(scopes.lookup_visible(root, "a"), Some(&1));
    }
}
