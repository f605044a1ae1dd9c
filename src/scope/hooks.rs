//! Host-side resolution hooks and shared parse state.
//!
//! The host parser owns a table/alias namespace and a set of already-resolved
//! query parameters. Scopes carry both opaquely: this core never interprets
//! them, it only hands them to whichever grammar engine is reducing the
//! fragment.

use parking_lot::RwLock;
use smol_str::SmolStr;

/// Kind of entity a name resolves to in the host namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostBindingKind {
    /// A table in the host's FROM list.
    Table,
    /// A column or range-variable alias.
    Alias,
    /// A query parameter.
    Parameter,
}

/// Resolution of a name against the host's namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBinding {
    /// Position of the entity in the host's own catalog of the namespace.
    pub ordinal: usize,
    /// What the name resolved to.
    pub kind: HostBindingKind,
}

/// Name-resolution callbacks into the host parser.
///
/// Implementations are supplied by the host when the root scope is created
/// and inherited verbatim by every child scope. Grammar engines may consult
/// the hooks during reduction; the scope machinery itself never calls them.
pub trait HostHooks: Send + Sync {
    /// Resolves an identifier against the host's table/alias namespace.
    ///
    /// Returns `None` when the host has no binding for the name.
    fn resolve_host_name(&self, name: &str) -> Option<HostBinding>;
}

/// Hooks for a standalone parse with no enclosing host namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHooks;

impl HostHooks for NullHooks {
    fn resolve_host_name(&self, _name: &str) -> Option<HostBinding> {
        None
    }
}

/// Shared host state for one query: the active graph's catalog identity and
/// the resolved-parameter table.
///
/// Scopes hold this behind an `Arc`, so a parameter the host resolves after
/// a child scope was pushed is immediately visible through that child.
#[derive(Debug)]
pub struct GraphContext {
    graph_name: SmolStr,
    params: RwLock<Vec<SmolStr>>,
}

impl GraphContext {
    /// Creates shared state for the given graph catalog identity.
    pub fn new(graph_name: impl Into<SmolStr>) -> Self {
        Self {
            graph_name: graph_name.into(),
            params: RwLock::new(Vec::new()),
        }
    }

    /// Catalog identity of the active graph.
    pub fn graph_name(&self) -> &str {
        self.graph_name.as_str()
    }

    /// Registers a resolved parameter, returning its ordinal.
    ///
    /// Registering a name twice returns the ordinal of the first
    /// registration.
    pub fn add_param(&self, name: impl Into<SmolStr>) -> usize {
        let name = name.into();
        let mut params = self.params.write();
        if let Some(ordinal) = params.iter().position(|param| *param == name) {
            return ordinal;
        }
        params.push(name);
        params.len() - 1
    }

    /// Looks up the ordinal of a previously registered parameter.
    pub fn param_ordinal(&self, name: &str) -> Option<usize> {
        self.params
            .read()
            .iter()
            .position(|param| param.as_str() == name)
    }

    /// Number of registered parameters.
    pub fn param_count(&self) -> usize {
        self.params.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_hooks_resolve_nothing() {
        assert_eq!(NullHooks.resolve_host_name("orders"), None);
    }

    #[test]
    fn params_register_and_resolve() {
        let graph = GraphContext::new("social");
        assert_eq!(graph.graph_name(), "social");
        assert_eq!(graph.param_count(), 0);
        assert_eq!(graph.param_ordinal("min_age"), None);

        assert_eq!(graph.add_param("min_age"), 0);
        assert_eq!(graph.add_param("city"), 1);
        assert_eq!(graph.param_ordinal("city"), Some(1));
        assert_eq!(graph.param_count(), 2);
    }

    #[test]
    fn duplicate_param_keeps_first_ordinal() {
        let graph = GraphContext::new("g");
        assert_eq!(graph.add_param("p"), 0);
        assert_eq!(graph.add_param("p"), 0);
        assert_eq!(graph.param_count(), 1);
    }
}
