//! Adapter between the host parser and an external grammar engine.
//!
//! The adapter owns the choreography and none of the parsing: push a child
//! scope for the fragment, install a position translator, hand the engine
//! the fragment text plus a [`ScopeHandle`] for name resolution, then
//! translate any error and unwind scope and translator on every exit path.
//!
//! One [`EmbeddedParser`] exists per query. Hosts processing queries
//! concurrently give each its own instance; nothing here is shared.

use crate::diag::{QueryText, Span};
use crate::error::{EmbedError, EngineError};
use crate::scope::{GraphContext, HostHooks, ScopeId, ScopeStack};
use crate::translate::Translators;
use smol_str::SmolStr;
use std::sync::Arc;

/// An external tokenize-and-reduce service for the embedded sub-language.
///
/// The engine receives the fragment text and a [`ScopeHandle`] through which
/// its reduction actions bind and look up names. Errors are reported in
/// fragment-local byte offsets; the adapter translates them before they
/// reach the host.
pub trait GrammarEngine<R> {
    /// The parsed representation of one fragment.
    type Output;

    /// Parses `fragment`, resolving names against `scope`.
    fn run(
        &self,
        fragment: &str,
        scope: &mut ScopeHandle<'_, R>,
    ) -> Result<Self::Output, EngineError>;
}

/// Adapts a closure into a [`GrammarEngine`].
pub struct EngineFn<F>(pub F);

impl<R, T, F> GrammarEngine<R> for EngineFn<F>
where
    F: Fn(&str, &mut ScopeHandle<'_, R>) -> Result<T, EngineError>,
{
    type Output = T;

    fn run(&self, fragment: &str, scope: &mut ScopeHandle<'_, R>) -> Result<T, EngineError> {
        (self.0)(fragment, scope)
    }
}

/// Resolution context handed to grammar actions for one fragment's scope.
///
/// Grammar reductions call back through this handle for every name they bind
/// or reference, and recurse through [`ScopeHandle::parse_nested`] when the
/// fragment itself embeds another sub-language fragment.
pub struct ScopeHandle<'a, R> {
    scopes: &'a mut ScopeStack<R>,
    translators: &'a mut Translators,
    scope: ScopeId,
}

impl<R> ScopeHandle<'_, R> {
    /// The scope this handle resolves against.
    pub fn scope_id(&self) -> ScopeId {
        self.scope
    }

    /// Binds `alias` to `referent` in the fragment's scope.
    pub fn bind(&mut self, alias: impl Into<SmolStr>, referent: R) {
        self.scopes.get_mut(self.scope).bind(alias, referent);
    }

    /// Looks up `alias` in the fragment's scope only.
    pub fn lookup(&self, alias: &str) -> Option<&R> {
        self.scopes.get(self.scope).lookup(alias)
    }

    /// Looks up `alias` in the fragment's scope and its ancestors.
    pub fn lookup_visible(&self, alias: &str) -> Option<&R> {
        self.scopes.lookup_visible(self.scope, alias)
    }

    /// Mints an anonymous alias in the fragment's scope.
    pub fn fresh_alias(&mut self, prefix: &str) -> SmolStr {
        self.scopes.get_mut(self.scope).fresh_alias(prefix)
    }

    /// Host resolution hooks carried by the scope.
    pub fn hooks(&self) -> &dyn HostHooks {
        self.scopes.get(self.scope).hooks()
    }

    /// Shared graph/parameter state carried by the scope.
    pub fn graph(&self) -> &GraphContext {
        self.scopes.get(self.scope).graph()
    }

    /// The full original query text.
    pub fn source(&self) -> QueryText {
        self.scopes.get(self.scope).source().clone()
    }

    /// Character offset of this fragment in the root text.
    pub fn fragment_offset(&self) -> usize {
        self.scopes.get(self.scope).source_offset()
    }

    /// Parses a sub-language fragment nested inside the current fragment.
    ///
    /// `fragment` is a byte range into the root query text, lying within the
    /// current fragment. A child scope and translator frame are pushed for
    /// the nested fragment and unwound before returning. A syntax error from
    /// the nested engine comes back rebased into the *current* fragment's
    /// local byte coordinates, so each nesting level applies exactly one
    /// rewrite as the error bubbles out and the outermost adapter produces
    /// the root-relative position.
    pub fn parse_nested<E: GrammarEngine<R>>(
        &mut self,
        fragment: Span,
        engine: &E,
    ) -> Result<E::Output, EngineError> {
        let outer_byte_start = self
            .translators
            .active()
            .expect("nested parse without an installed translator")
            .fragment_byte_offset();
        let source = self.source();

        let result = run_fragment(
            self.scopes,
            self.translators,
            &source,
            self.scope,
            fragment,
            engine,
        );

        result.map_err(|err| match err {
            EmbedError::Cancelled => EngineError::Cancelled,
            EmbedError::Syntax { position, message } => EngineError::Syntax {
                local_offset: source.char_to_byte(position).saturating_sub(outer_byte_start),
                message,
            },
        })
    }
}

/// Parse-state for all embedded fragments of one query.
///
/// Owns the scope stack and translator stack; the root scope covering the
/// whole query is pushed at construction and lives as long as the parser.
pub struct EmbeddedParser<R> {
    scopes: ScopeStack<R>,
    translators: Translators,
    source: QueryText,
    root: ScopeId,
}

impl<R> EmbeddedParser<R> {
    /// Creates the parse state for one query.
    pub fn new(source: QueryText, hooks: Arc<dyn HostHooks>, graph: Arc<GraphContext>) -> Self {
        let mut scopes = ScopeStack::new();
        let root = scopes.push_root(source.clone(), hooks, graph);
        Self {
            scopes,
            translators: Translators::new(),
            source,
            root,
        }
    }

    /// The root scope covering the whole query text.
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// The full original query text.
    pub fn source(&self) -> &QueryText {
        &self.source
    }

    /// Read access to the scope arena.
    pub fn scopes(&self) -> &ScopeStack<R> {
        &self.scopes
    }

    /// Mutable access to the scope arena, for hosts that bind names into
    /// the root scope before parsing fragments.
    pub fn scopes_mut(&mut self) -> &mut ScopeStack<R> {
        &mut self.scopes
    }

    /// Number of translator frames currently installed.
    ///
    /// Zero whenever no fragment parse is in flight.
    pub fn translator_depth(&self) -> usize {
        self.translators.depth()
    }

    /// Parses one embedded fragment with `engine`.
    ///
    /// `fragment` is a byte range into the root query text; `parent` is the
    /// scope that was active where the fragment appears (usually
    /// [`EmbeddedParser::root`]). A child scope and a translator frame are
    /// installed for the duration of the parse and unwound on success and
    /// failure alike. Errors come back with positions translated to
    /// character offsets in the root text.
    pub fn parse_fragment<E: GrammarEngine<R>>(
        &mut self,
        parent: ScopeId,
        fragment: Span,
        engine: &E,
    ) -> Result<E::Output, EmbedError> {
        run_fragment(
            &mut self.scopes,
            &mut self.translators,
            &self.source,
            parent,
            fragment,
            engine,
        )
    }
}

/// Shared fragment choreography for top-level and nested parses.
///
/// Pushes the fragment's scope, installs its translator frame, runs the
/// engine, rewrites any engine error through the frame (producing a
/// root-relative character position), then unwinds frame and scope on every
/// exit path.
fn run_fragment<R, E: GrammarEngine<R>>(
    scopes: &mut ScopeStack<R>,
    translators: &mut Translators,
    source: &QueryText,
    parent: ScopeId,
    fragment: Span,
    engine: &E,
) -> Result<E::Output, EmbedError> {
    let offset_chars = source.byte_to_char(fragment.start);
    let scope = scopes.push_child(parent);
    scopes.set_fragment_offset(scope, offset_chars);
    translators.install(scope, source, offset_chars);

    let result = {
        let fragment_text = source.slice(fragment);
        let mut handle = ScopeHandle {
            scopes: &mut *scopes,
            translators: &mut *translators,
            scope,
        };
        engine.run(fragment_text, &mut handle)
    };

    // Rewrite through this fragment's frame, then unwind it. Both happen on
    // the success and error paths alike.
    let result = result.map_err(|err| translators.translate(err));
    translators.uninstall();
    scopes.pop(scope);
    result
}
