//! Hierarchical parse scopes for embedded sub-language fragments.
//!
//! Each embedded fragment is parsed inside its own [`Scope`], a child of the
//! scope that was active when the fragment was encountered. A child inherits
//! the query text, host hooks, and shared graph state from its parent by
//! reference; it keeps its own alias bindings and anonymous-alias counter.
//!
//! Scopes live in a [`ScopeStack`] arena and are addressed by [`ScopeId`],
//! so parent links are indices rather than references and popping a scope
//! empties its slot. Sub-parsing is synchronous and strictly nested: the
//! live scopes always form a simple path from the root, and a scope is
//! popped by the same call frame that pushed it.

mod alias;
mod hooks;

pub use alias::ANON_ALIAS_PREFIX;
pub use hooks::{GraphContext, HostBinding, HostBindingKind, HostHooks, NullHooks};

use crate::diag::QueryText;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identifier of a scope within one parse's [`ScopeStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Returns the raw arena index.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// One nested parsing context.
///
/// `R` is the host-chosen referent type bound to aliases; the scope
/// machinery treats it as opaque.
pub struct Scope<R> {
    id: ScopeId,
    parent: Option<ScopeId>,
    source: QueryText,
    source_offset: usize,
    hooks: Arc<dyn HostHooks>,
    graph: Arc<GraphContext>,
    pub(crate) bound: Vec<(SmolStr, R)>,
    pub(crate) next_anon: u32,
    live_children: usize,
}

impl<R> Scope<R> {
    /// Returns this scope's identifier.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Returns the enclosing scope, or `None` for the root.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// The full original query text, shared with every other scope.
    pub fn source(&self) -> &QueryText {
        &self.source
    }

    /// Character offset in the root text where this scope's fragment begins.
    ///
    /// Zero for the root scope.
    pub fn source_offset(&self) -> usize {
        self.source_offset
    }

    /// Host resolution hooks, inherited verbatim from the parent.
    pub fn hooks(&self) -> &dyn HostHooks {
        self.hooks.as_ref()
    }

    /// Shared graph/parameter state, inherited by reference.
    pub fn graph(&self) -> &GraphContext {
        &self.graph
    }
}

impl<R> fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("source_offset", &self.source_offset)
            .field(
                "bound",
                &self.bound.iter().map(|(alias, _)| alias).collect::<Vec<_>>(),
            )
            .field("next_anon", &self.next_anon)
            .finish_non_exhaustive()
    }
}

/// Arena of scopes for one query's parse.
///
/// Each concurrently parsed query owns its own stack; nothing here is shared
/// across queries.
pub struct ScopeStack<R> {
    scopes: Vec<Option<Scope<R>>>,
}

impl<R> ScopeStack<R> {
    /// Creates an empty scope stack.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Pushes the root scope for a query.
    ///
    /// The root covers the whole query text, so its fragment offset is 0.
    pub fn push_root(
        &mut self,
        source: QueryText,
        hooks: Arc<dyn HostHooks>,
        graph: Arc<GraphContext>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        debug!(scope = id.0, "push root scope");
        self.scopes.push(Some(Scope {
            id,
            parent: None,
            source,
            source_offset: 0,
            hooks,
            graph,
            bound: Vec::new(),
            next_anon: 0,
            live_children: 0,
        }));
        id
    }

    /// Pushes a child scope under `parent`.
    ///
    /// The child inherits the query text, hooks, and graph state by
    /// reference and seeds its fragment offset from the parent's; the caller
    /// overwrites the offset via [`ScopeStack::set_fragment_offset`] once
    /// the fragment being entered is known. Bindings start empty and the
    /// anonymous-alias counter starts at 0 regardless of the parent's.
    pub fn push_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let (source, hooks, graph, offset) = {
            let parent = self.get(parent);
            (
                parent.source.clone(),
                Arc::clone(&parent.hooks),
                Arc::clone(&parent.graph),
                parent.source_offset,
            )
        };
        self.slot_mut(parent).live_children += 1;
        debug!(scope = id.0, parent = parent.as_usize(), "push child scope");
        self.scopes.push(Some(Scope {
            id,
            parent: Some(parent),
            source,
            source_offset: offset,
            hooks,
            graph,
            bound: Vec::new(),
            next_anon: 0,
            live_children: 0,
        }));
        id
    }

    /// Releases a scope.
    ///
    /// The caller guarantees no further reads of the scope or its
    /// descendants; any children must already have been popped. Popping does
    /// not cascade.
    pub fn pop(&mut self, id: ScopeId) {
        let scope = self
            .scopes
            .get_mut(id.0)
            .expect("pop of an unknown scope id")
            .take()
            .expect("scope popped twice");
        assert_eq!(
            scope.live_children, 0,
            "scope {} popped while {} child scope(s) are still live",
            id.0, scope.live_children
        );
        debug!(scope = id.0, "pop scope");
        if let Some(parent) = scope.parent {
            self.slot_mut(parent).live_children -= 1;
        }
    }

    /// Returns the scope for `id`.
    ///
    /// Panics if the scope was popped: reading a released scope is a
    /// caller-contract violation.
    pub fn get(&self, id: ScopeId) -> &Scope<R> {
        self.scopes
            .get(id.0)
            .expect("access to an unknown scope id")
            .as_ref()
            .expect("access to a released scope")
    }

    /// Mutable access to the scope for `id`.
    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope<R> {
        self.slot_mut(id)
    }

    /// Records where `id`'s fragment begins in the root text.
    pub fn set_fragment_offset(&mut self, id: ScopeId, offset: usize) {
        let scope = self.slot_mut(id);
        assert!(
            offset <= scope.source.len_chars(),
            "fragment offset {offset} is outside the query text ({} chars)",
            scope.source.len_chars()
        );
        scope.source_offset = offset;
    }

    /// Whether `id` has been pushed and not yet popped.
    pub fn is_live(&self, id: ScopeId) -> bool {
        self.scopes.get(id.0).is_some_and(|slot| slot.is_some())
    }

    /// Number of scopes currently live.
    pub fn live_count(&self) -> usize {
        self.scopes.iter().filter(|slot| slot.is_some()).count()
    }

    fn slot_mut(&mut self, id: ScopeId) -> &mut Scope<R> {
        self.scopes
            .get_mut(id.0)
            .expect("access to an unknown scope id")
            .as_mut()
            .expect("access to a released scope")
    }
}

impl<R> Default for ScopeStack<R> {
    fn default() -> Self {
        Self::new()
    }
}
