//! Parse-state core for embedding a property-graph query sub-language
//! inside a host SQL parser.
//!
//! A host parser that encounters an embedded graph pattern fragment pushes a
//! child [`scope`](crate::scope) for it, hands the fragment to a grammar
//! engine through the [`adapter`](crate::adapter), and gets back either the
//! engine's output or an error whose position has been
//! [translated](crate::translate) from fragment-local coordinates into a
//! character offset in the original query text. Aliases the fragment binds,
//! user-written or generated for anonymous elements, live in the fragment's
//! scope and resolve against the host's namespace through the hooks the
//! scope carries.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gql_embed::engine::PatternEngine;
//! use gql_embed::{EmbeddedParser, GraphContext, NullHooks, QueryText};
//!
//! let sql = "SELECT 1 FROM g WHERE MATCH (a:Person)-[:knows]->(b)";
//! let fragment = sql.find('(').unwrap()..sql.len();
//!
//! let source = QueryText::new(sql);
//! let graph = Arc::new(GraphContext::new("g"));
//! let mut parser = EmbeddedParser::new(source, Arc::new(NullHooks), graph);
//!
//! let root = parser.root();
//! let paths = parser
//!     .parse_fragment(root, fragment, &PatternEngine::new())
//!     .unwrap();
//! assert_eq!(paths[0].elements.len(), 3);
//! ```

pub mod adapter;
pub mod diag;
pub mod engine;
pub mod error;
pub mod scope;
pub mod translate;

// Re-export the adapter surface.
pub use adapter::{EmbeddedParser, EngineFn, GrammarEngine, ScopeHandle};

// Re-export diagnostic and error primitives.
pub use diag::{Diag, DiagSeverity, QueryText, Span};
pub use error::{EmbedError, EngineError};

// Re-export scope and translator types.
pub use scope::{
    ANON_ALIAS_PREFIX, GraphContext, HostBinding, HostBindingKind, HostHooks, NullHooks, Scope,
    ScopeId, ScopeStack,
};
pub use translate::{TranslatorGuard, Translators};
